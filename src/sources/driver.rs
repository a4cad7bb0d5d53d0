//! # Run driver: sequential signal delivery for one subscription.
//!
//! The driver is the single place where signals cross from the stage chain to
//! the subscriber. It enforces the protocol invariants for one run:
//!
//! ```text
//! loop {
//!   ├─► cancelled?            ─► stop, deliver nothing
//!   ├─► pull stage.next()      (races the cancellation token, biased)
//!   │       │
//!   │       ├─ Next(v)     ──► subscriber.on_next(v)
//!   │       ├─ Complete    ──► mark terminated, subscriber.on_complete(), stop
//!   │       └─ Error(e)    ──► mark terminated, subscriber.on_error(e), stop
//!   └─ repeat
//! }
//! ```
//!
//! ## Rules
//! - Signals are delivered **strictly one at a time**; no two signals for the
//!   same subscription are ever in flight concurrently.
//! - At most one terminal signal per run, always the last signal.
//! - Cancellation is observed **before** the next dispatch: the pull is raced
//!   against the cancellation token with a biased select, and the loop head
//!   re-checks after every callback (covering `cancel` from inside `on_next`).
//! - Subscriber callback panics are caught and reported to stderr; they never
//!   corrupt the protocol state machine.

use std::sync::Arc;

use futures::FutureExt;

use crate::signal::Signal;
use crate::sources::producer::BoxStage;
use crate::subscribers::Subscriber;
use crate::subscription::Subscription;

/// Runs one subscription to its end: terminal signal or cancellation.
pub(crate) async fn drive<T: Send + 'static>(
    mut stage: BoxStage<T>,
    subscriber: Arc<dyn Subscriber<T>>,
    subscription: Subscription,
) {
    loop {
        if subscription.is_cancelled() {
            return;
        }

        let signal = tokio::select! {
            biased;
            _ = subscription.cancelled() => return,
            signal = stage.next(&subscription) => signal,
        };

        match signal {
            Signal::Next(value) => {
                deliver(subscriber.name(), subscriber.on_next(value)).await;
            }
            Signal::Complete => {
                subscription.terminate();
                deliver(subscriber.name(), subscriber.on_complete()).await;
                return;
            }
            Signal::Error(err) => {
                subscription.terminate();
                deliver(subscriber.name(), subscriber.on_error(err)).await;
                return;
            }
        }
    }
}

/// Invokes one subscriber callback, isolating panics.
async fn deliver<F>(name: &str, callback: F)
where
    F: std::future::Future<Output = ()>,
{
    if let Err(panic) = std::panic::AssertUnwindSafe(callback).catch_unwind().await {
        eprintln!("[fluxion] subscriber '{name}' panicked: {panic:?}");
    }
}
