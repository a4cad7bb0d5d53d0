//! Internal production traits: cold recipes and per-run stages.
//!
//! A [`Producer`] is the immutable half of a source: a recipe that owns
//! nothing at rest and can be assembled into fresh per-run state any number
//! of times (cold semantics). A [`Stage`] is the mutable half: the per-run
//! pull handle the driver polls for the next signal.
//!
//! ```text
//! Source ── subscribe ──► Producer::assemble (fresh per run)
//!                              │
//!                              ▼
//!                         BoxStage chain ◄── driver pulls one signal at a time
//! ```
//!
//! ## Rules
//! - `assemble` must not share mutable state between runs.
//! - After a stage returns a terminal signal it is not pulled again.
//! - The value-producing leaf claims one unit of demand (via
//!   [`Subscription::acquire`]) before producing each value; terminal
//!   signals require no demand.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::subscription::{RequestObserver, Subscription};

pub(crate) type BoxStage<T> = Box<dyn Stage<T>>;
pub(crate) type SubscribeObserver = Arc<dyn Fn(&Subscription) + Send + Sync>;

/// Observers collected while assembling one run's stage chain.
///
/// `do_on_subscribe` observers fire once the subscription exists (before the
/// subscriber's own `on_subscribe`); `do_on_request` observers are installed
/// into the [`Subscription`] and fire on every grant. Collection order is
/// upstream-first, matching signal propagation.
#[derive(Default)]
pub(crate) struct RunHooks {
    pub(crate) on_subscribe: Vec<SubscribeObserver>,
    pub(crate) on_request: Vec<RequestObserver>,
}

/// Cold recipe for one pipeline stage (and, transitively, its upstream).
pub(crate) trait Producer<T>: Send + Sync {
    /// Builds fresh per-run state for one subscription.
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T>;
}

/// Per-run pull handle.
///
/// The driver (or a downstream stage) pulls signals one at a time; pulls are
/// strictly sequential within a run.
#[async_trait]
pub(crate) trait Stage<T>: Send {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T>;
}

/// Leaf recipe replaying a fixed list of values (used by `just`/`from_iter`).
pub(crate) struct IterProducer<T> {
    items: Vec<T>,
}

impl<T: Clone> IterProducer<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Clone + Send + Sync + 'static> Producer<T> for IterProducer<T> {
    fn assemble(&self, _hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(IterStage {
            items: self.items.clone().into_iter(),
        })
    }
}

struct IterStage<T> {
    items: std::vec::IntoIter<T>,
}

#[async_trait]
impl<T: Send + 'static> Stage<T> for IterStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        match self.items.next() {
            Some(value) => {
                subscription.acquire().await;
                Signal::Next(value)
            }
            None => Signal::Complete,
        }
    }
}

/// Leaf recipe counting `count` integers upward from `start`.
pub(crate) struct RangeProducer {
    start: i64,
    count: u64,
}

impl RangeProducer {
    pub(crate) fn new(start: i64, count: u64) -> Self {
        Self { start, count }
    }
}

impl Producer<i64> for RangeProducer {
    fn assemble(&self, _hooks: &mut RunHooks) -> BoxStage<i64> {
        Box::new(RangeStage {
            next: self.start,
            remaining: self.count,
        })
    }
}

struct RangeStage {
    next: i64,
    remaining: u64,
}

#[async_trait]
impl Stage<i64> for RangeStage {
    async fn next(&mut self, subscription: &Subscription) -> Signal<i64> {
        if self.remaining == 0 {
            return Signal::Complete;
        }
        subscription.acquire().await;
        self.remaining -= 1;
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        Signal::Next(value)
    }
}

/// Leaf recipe that completes immediately, without consuming demand.
pub(crate) struct EmptyProducer;

impl<T: Send + 'static> Producer<T> for EmptyProducer {
    fn assemble(&self, _hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(EmptyStage)
    }
}

struct EmptyStage;

#[async_trait]
impl<T: Send + 'static> Stage<T> for EmptyStage {
    async fn next(&mut self, _subscription: &Subscription) -> Signal<T> {
        Signal::Complete
    }
}

/// Leaf recipe that errors immediately, without emitting any value.
pub(crate) struct FailProducer {
    error: StreamError,
}

impl FailProducer {
    pub(crate) fn new(error: StreamError) -> Self {
        Self { error }
    }
}

impl<T: Send + 'static> Producer<T> for FailProducer {
    fn assemble(&self, _hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(FailStage {
            error: Some(self.error.clone()),
        })
    }
}

struct FailStage {
    error: Option<StreamError>,
}

#[async_trait]
impl<T: Send + 'static> Stage<T> for FailStage {
    async fn next(&mut self, _subscription: &Subscription) -> Signal<T> {
        match self.error.take() {
            Some(err) => Signal::Error(err),
            None => Signal::Complete,
        }
    }
}

/// Leaf recipe that never signals (useful for timeout tests and demos).
pub(crate) struct NeverProducer;

impl<T: Send + 'static> Producer<T> for NeverProducer {
    fn assemble(&self, _hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(NeverStage)
    }
}

struct NeverStage;

#[async_trait]
impl<T: Send + 'static> Stage<T> for NeverStage {
    async fn next(&mut self, _subscription: &Subscription) -> Signal<T> {
        futures::future::pending::<()>().await;
        Signal::Complete
    }
}
