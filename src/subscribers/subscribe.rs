//! # Core subscriber trait
//!
//! `Subscriber` is the extension point for consuming a stream. Callbacks are
//! delivered strictly one at a time by the run driver; no two callbacks for
//! the same subscription are ever in flight concurrently.
//!
//! ## Contract
//! - `on_subscribe` receives the per-run [`Subscription`] and drives demand.
//!   The default requests unbounded demand, so the full sequence drains with
//!   no further intervention (fire-and-forget mode).
//! - After a terminal callback (`on_complete` / `on_error`), nothing else is
//!   invoked for that run.
//! - Calling [`Subscription::cancel`] from inside any callback is safe; the
//!   in-flight callback finishes, then no further signal follows.

use async_trait::async_trait;

use crate::error::StreamError;
use crate::subscription::Subscription;

/// Contract for stream consumers.
///
/// All callbacks have defaults, so an implementation only overrides what it
/// reacts to. Implementations should avoid blocking the async runtime.
#[async_trait]
pub trait Subscriber<T: Send + 'static>: Send + Sync + 'static {
    /// Called once, synchronously, when the subscription is established.
    ///
    /// The default grants unbounded demand. Override to request a bounded
    /// quantum, stash the subscription for later cancellation, or both.
    async fn on_subscribe(&self, subscription: &Subscription) {
        subscription.request_unbounded();
    }

    /// Handles one value, delivered against one unit of granted demand.
    async fn on_next(&self, value: T) {
        let _ = value;
    }

    /// Called once if the run ends successfully.
    async fn on_complete(&self) {}

    /// Called once if the run ends with a failure.
    async fn on_error(&self, error: StreamError) {
        let _ = error;
    }

    /// Human-readable name (for diagnostics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
