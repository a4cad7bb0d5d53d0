//! Sequence engine: cold source recipes and the per-run delivery driver.
//!
//! The only public API from this module is [`Source`]. Internal modules:
//! - [`producer`]: the cold-recipe / per-run-stage split and the leaf sources;
//! - [`driver`]: the loop that delivers signals strictly one at a time;
//! - [`source`]: the public recipe type, constructors, and operator methods.

mod driver;
mod producer;
mod source;

pub use source::Source;

pub(crate) use producer::{BoxStage, Producer, RunHooks, Stage};
