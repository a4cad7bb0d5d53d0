//! # `Source`: a cold, replayable description of a value sequence.
//!
//! A [`Source`] is an immutable recipe. It owns nothing at rest and is
//! re-evaluated fresh for every subscription: subscribing twice produces two
//! independent, identical runs (cold-replay semantics). Cloning a `Source` is
//! cheap (it clones an `Arc` to the recipe), so one source can be shared,
//! decorated with operators, and verified any number of times.
//!
//! ## Control flow of one run
//! ```text
//! subscribe(subscriber)
//!   ├─► assemble fresh stage chain (per-run operator state)
//!   ├─► create Subscription, install do_on_request observers
//!   ├─► fire do_on_subscribe observers (upstream-first)
//!   ├─► subscriber.on_subscribe(&subscription)   (may request demand)
//!   └─► driver loop: pull → deliver, until terminal or cancel
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::StreamError;
use crate::operators::{
    DoOnErrorProducer, DoOnNextProducer, DoOnRequestProducer, DoOnSubscribeProducer,
    DoOnSuccessProducer, FlatMapProducer, LogProducer, MapProducer, ResumeProducer,
    ReturnProducer,
};
use crate::sources::driver::drive;
use crate::sources::producer::{
    BoxStage, EmptyProducer, FailProducer, IterProducer, NeverProducer, Producer,
    RangeProducer, RunHooks,
};
use crate::subscribers::{FnSubscriber, Subscriber};
use crate::subscription::Subscription;

/// Cold, replayable description of an asynchronous value sequence.
pub struct Source<T> {
    producer: Arc<dyn Producer<T>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + Sync + 'static> Source<T> {
    pub(crate) fn from_producer(producer: impl Producer<T> + 'static) -> Self {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// A source that completes immediately without emitting any value.
    pub fn empty() -> Self {
        Self::from_producer(EmptyProducer)
    }

    /// A source that fails immediately with `error`, emitting no value.
    pub fn fail(error: StreamError) -> Self {
        Self::from_producer(FailProducer::new(error))
    }

    /// A source that never signals.
    ///
    /// Useful for exercising timeouts; any verification of it must rely on
    /// the harness timeout rather than a terminal signal.
    pub fn never() -> Self {
        Self::from_producer(NeverProducer)
    }

    /// A single-value source: one `Next(value)` then `Complete`.
    pub fn just(value: T) -> Self
    where
        T: Clone,
    {
        Self::from_producer(IterProducer::new(vec![value]))
    }

    /// A source replaying `items` in order, then completing.
    pub fn from_iter<I>(items: I) -> Self
    where
        T: Clone,
        I: IntoIterator<Item = T>,
    {
        Self::from_producer(IterProducer::new(items.into_iter().collect()))
    }

    /// Transforms each value with `transform` (1:1 demand passthrough).
    ///
    /// If `transform` rejects a value, the raw value is suppressed, upstream
    /// production stops, and a single `Error` terminates the run (any pending
    /// `Complete` is skipped).
    pub fn map<U, F>(&self, transform: F) -> Source<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> Result<U, StreamError> + Send + Sync + 'static,
    {
        Source::from_producer(MapProducer::new(
            Arc::clone(&self.producer),
            Arc::new(transform),
        ))
    }

    /// Expands each value into an inner source and relays its signals.
    ///
    /// Each inner source is fully drained before the next upstream value is
    /// pulled; an inner `empty()` contributes no `Next` for that element.
    /// An error from either side short-circuits to one downstream `Error`.
    pub fn flat_map<U, F>(&self, expand: F) -> Source<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> Source<U> + Send + Sync + 'static,
    {
        Source::from_producer(FlatMapProducer::new(
            Arc::clone(&self.producer),
            Arc::new(expand),
        ))
    }

    /// On upstream error, switches to the replacement source from `fallback`.
    ///
    /// This is a one-shot terminal substitution: the original stream is
    /// abandoned, and the replacement's signals continue the run.
    pub fn on_error_resume<F>(&self, fallback: F) -> Source<T>
    where
        F: Fn(&StreamError) -> Source<T> + Send + Sync + 'static,
    {
        Source::from_producer(ResumeProducer::new(
            Arc::clone(&self.producer),
            Arc::new(fallback),
        ))
    }

    /// On upstream error, emits `Next(value)` then `Complete`.
    ///
    /// The original cause is never forwarded downstream. Chained after an
    /// already-recovering operator this never triggers: the error occurs at
    /// most once per run and was consumed upstream.
    pub fn on_error_return(&self, value: T) -> Source<T>
    where
        T: Clone,
    {
        Source::from_producer(ReturnProducer::new(Arc::clone(&self.producer), value))
    }

    /// Observes subscription establishment, before the subscriber's own
    /// `on_subscribe`.
    pub fn do_on_subscribe<F>(&self, observer: F) -> Source<T>
    where
        F: Fn(&Subscription) + Send + Sync + 'static,
    {
        Source::from_producer(DoOnSubscribeProducer::new(
            Arc::clone(&self.producer),
            Arc::new(observer),
        ))
    }

    /// Observes every demand grant made through the run's subscription.
    pub fn do_on_request<F>(&self, observer: F) -> Source<T>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        Source::from_producer(DoOnRequestProducer::new(
            Arc::clone(&self.producer),
            Arc::new(observer),
        ))
    }

    /// Observes each value flowing through this point of the chain.
    ///
    /// A panicking observer is isolated and surfaced as a single `Error`
    /// signal; it cannot corrupt signal ordering.
    pub fn do_on_next<F>(&self, observer: F) -> Source<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Source::from_producer(DoOnNextProducer::new(
            Arc::clone(&self.producer),
            Arc::new(observer),
        ))
    }

    /// Observes successful completion, with the last value seen at this point
    /// of the chain (`None` when the run completed empty).
    pub fn do_on_success<F>(&self, observer: F) -> Source<T>
    where
        T: Clone,
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        Source::from_producer(DoOnSuccessProducer::new(
            Arc::clone(&self.producer),
            Arc::new(observer),
        ))
    }

    /// Observes the error cause just before it terminates the run.
    pub fn do_on_error<F>(&self, observer: F) -> Source<T>
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        Source::from_producer(DoOnErrorProducer::new(
            Arc::clone(&self.producer),
            Arc::new(observer),
        ))
    }

    /// Prints every protocol event at this point of the chain to stdout.
    ///
    /// Diagnostics only; never affects protocol correctness.
    pub fn log(&self, label: impl Into<String>) -> Source<T>
    where
        T: Debug,
    {
        Source::from_producer(LogProducer::new(Arc::clone(&self.producer), label.into()))
    }

    /// Subscribes `subscriber` and runs to a terminal signal or cancellation.
    ///
    /// Each call is an independent, isolated run with its own subscription
    /// and per-run operator state. The returned future resolves when the run
    /// ends; it does not resolve for a source that never terminates.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let subscription = Subscription::new();
        let stage = self.assemble_run(&subscription);
        subscriber.on_subscribe(&subscription).await;
        drive(stage, subscriber, subscription).await;
    }

    /// Fire-and-forget subscribe: unbounded demand, values to `on_next`.
    pub async fn subscribe_unbounded<F>(&self, on_next: F)
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::new().next(on_next)))
            .await;
    }

    /// Assembles fresh per-run state against an existing subscription.
    ///
    /// Also used mid-run by flatMap and error recovery to attach inner runs:
    /// their `do_on_subscribe` observers fire immediately and their
    /// `do_on_request` observers join whichever subscription drives the
    /// inner pulls.
    pub(crate) fn assemble_run(&self, subscription: &Subscription) -> BoxStage<T> {
        let mut hooks = RunHooks::default();
        let stage = self.producer.assemble(&mut hooks);
        subscription.add_request_observers(hooks.on_request);
        for observer in hooks.on_subscribe {
            observer(subscription);
        }
        stage
    }
}

impl Source<i64> {
    /// A source counting `count` integers upward from `start`.
    pub fn range(start: i64, count: u64) -> Self {
        Self::from_producer(RangeProducer::new(start, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::signal::Signal;
    use crate::subscription::RunState;
    use crate::verify::Verifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Collects the observable signal sequence of a run.
    struct Collector {
        seen: Mutex<Vec<Signal<i64>>>,
    }

    impl Collector {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Signal<i64>> {
            self.seen.lock().expect("collector lock").clone()
        }
    }

    #[async_trait]
    impl Subscriber<i64> for Collector {
        async fn on_next(&self, value: i64) {
            self.seen.lock().expect("collector lock").push(Signal::Next(value));
        }

        async fn on_complete(&self) {
            self.seen.lock().expect("collector lock").push(Signal::Complete);
        }

        async fn on_error(&self, error: StreamError) {
            self.seen.lock().expect("collector lock").push(Signal::Error(error));
        }
    }

    #[tokio::test]
    async fn test_just_emits_value_then_completes() {
        let source = Source::just(42i64);
        Verifier::create(&source)
            .expect_next(42)
            .verify_complete()
            .await;
    }

    #[tokio::test]
    async fn test_empty_completes_without_values() {
        let source = Source::<i64>::empty();
        Verifier::create(&source).verify_complete().await;
    }

    #[tokio::test]
    async fn test_fail_emits_only_error() {
        let source = Source::<i64>::fail(StreamError::source("configured to fail"));
        Verifier::create(&source)
            .expect_error(ErrorKind::Source)
            .verify()
            .await;
    }

    #[tokio::test]
    async fn test_range_preserves_order() {
        let source = Source::range(1, 5);
        Verifier::create(&source)
            .expect_next_seq([1, 2, 3, 4, 5])
            .verify_complete()
            .await;
    }

    #[tokio::test]
    async fn test_from_iter_preserves_order() {
        let source = Source::from_iter(vec![10i64, 20, 30]);
        Verifier::create(&source)
            .expect_next_seq([10, 20, 30])
            .verify_complete()
            .await;
    }

    #[tokio::test]
    async fn test_cold_replay_produces_independent_identical_runs() {
        let source = Source::range(1, 3);

        let first = Collector::new();
        source.subscribe(first.clone() as Arc<dyn Subscriber<i64>>).await;
        let second = Collector::new();
        source.subscribe(second.clone() as Arc<dyn Subscriber<i64>>).await;

        let expected = vec![
            Signal::Next(1),
            Signal::Next(2),
            Signal::Next(3),
            Signal::Complete,
        ];
        assert_eq!(first.seen(), expected);
        assert_eq!(second.seen(), expected);
    }

    #[tokio::test]
    async fn test_subscribe_unbounded_drains_full_sequence() {
        let total = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&total);
        Source::range(1, 10)
            .subscribe_unbounded(move |v| {
                sink.fetch_add(v as u64, Ordering::SeqCst);
            })
            .await;
        assert_eq!(total.load(Ordering::SeqCst), 55);
    }

    #[tokio::test]
    async fn test_terminal_signal_is_last_and_unique() {
        let source = Source::range(1, 2);
        let collector = Collector::new();
        source
            .subscribe(collector.clone() as Arc<dyn Subscriber<i64>>)
            .await;

        let seen = collector.seen();
        let terminals = seen.iter().filter(|s| s.is_terminal()).count();
        assert_eq!(terminals, 1);
        assert!(seen.last().map(Signal::is_terminal).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_run_state_terminated_after_completion() {
        struct Probe {
            subscription: Mutex<Option<Subscription>>,
        }

        #[async_trait]
        impl Subscriber<i64> for Probe {
            async fn on_subscribe(&self, subscription: &Subscription) {
                *self.subscription.lock().expect("probe lock") = Some(subscription.clone());
                subscription.request_unbounded();
            }
        }

        let probe = Arc::new(Probe {
            subscription: Mutex::new(None),
        });
        Source::range(1, 3)
            .subscribe(probe.clone() as Arc<dyn Subscriber<i64>>)
            .await;

        let subscription = probe
            .subscription
            .lock()
            .expect("probe lock")
            .clone()
            .expect("on_subscribe ran");
        assert_eq!(subscription.state(), RunState::Terminated);
    }
}
