//! # Stream subscribers.
//!
//! This module provides the [`Subscriber`] trait and built-in implementations
//! for consuming the signals of a [`Source`](crate::sources::Source) run.
//!
//! ## Subscriber types
//! - [`FnSubscriber`] — assemble a subscriber from optional closures
//!   (the fire-and-forget `subscribe_unbounded` surface);
//! - [`BoundedSubscriber`] — wrap any subscriber with fixed-quantum demand;
//! - [`LogWriter`] — print every callback (demos and debugging).
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use fluxion::{StreamError, Subscriber};
//! use async_trait::async_trait;
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Subscriber<i64> for Metrics {
//!     async fn on_next(&self, value: i64) {
//!         // record value...
//!         let _ = value;
//!     }
//!
//!     async fn on_error(&self, error: StreamError) {
//!         // increment failure counter
//!         let _ = error;
//!     }
//! }
//! ```

mod bounded;
mod lambda;
mod log;
mod subscribe;

pub use bounded::BoundedSubscriber;
pub use lambda::FnSubscriber;
pub use log::LogWriter;
pub use subscribe::Subscriber;
