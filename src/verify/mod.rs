//! Verification harness: scripted, deterministic stream assertions.
//!
//! The only public API from this module is [`Verifier`]. Internal modules:
//! - [`record`]: the subscriber that captures a run's signal sequence;
//! - [`verifier`]: the expectation script and the comparison diagnostics.

mod record;
mod verifier;

pub use verifier::Verifier;
