//! Side-effect observers: pass every signal through unmodified.
//!
//! Hooks observe the stream without rewriting it. A panicking observer must
//! not corrupt signal ordering: the panic is caught and surfaced as a single
//! `Error` signal (the at-most-one-terminal invariant holds because the
//! panicking hook's own signal is replaced, never duplicated).
//!
//! `do_on_subscribe` and `do_on_request` observe protocol events rather than
//! data signals; their recipes register observers into the run during
//! assembly and forward the upstream stage untouched.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::sources::{BoxStage, Producer, RunHooks, Stage};
use crate::subscription::{RequestObserver, Subscription};

type SubscribeObserver = Arc<dyn Fn(&Subscription) + Send + Sync>;
type NextObserver<T> = Arc<dyn Fn(&T) + Send + Sync>;
type SuccessObserver<T> = Arc<dyn Fn(Option<&T>) + Send + Sync>;
type ErrorObserver = Arc<dyn Fn(&StreamError) + Send + Sync>;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Recipe for `Source::do_on_subscribe`.
pub(crate) struct DoOnSubscribeProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    observer: SubscribeObserver,
}

impl<T> DoOnSubscribeProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, observer: SubscribeObserver) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Send + Sync + 'static> Producer<T> for DoOnSubscribeProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        // Upstream assembles first, so upstream observers fire first.
        let stage = self.upstream.assemble(hooks);
        hooks.on_subscribe.push(Arc::clone(&self.observer));
        stage
    }
}

/// Recipe for `Source::do_on_request`.
pub(crate) struct DoOnRequestProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    observer: RequestObserver,
}

impl<T> DoOnRequestProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, observer: RequestObserver) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Send + Sync + 'static> Producer<T> for DoOnRequestProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        let stage = self.upstream.assemble(hooks);
        hooks.on_request.push(Arc::clone(&self.observer));
        stage
    }
}

/// Recipe for `Source::do_on_next`.
pub(crate) struct DoOnNextProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    observer: NextObserver<T>,
}

impl<T> DoOnNextProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, observer: NextObserver<T>) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Send + Sync + 'static> Producer<T> for DoOnNextProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(DoOnNextStage {
            upstream: self.upstream.assemble(hooks),
            observer: Arc::clone(&self.observer),
            done: false,
        })
    }
}

struct DoOnNextStage<T> {
    upstream: BoxStage<T>,
    observer: NextObserver<T>,
    done: bool,
}

#[async_trait]
impl<T: Send + Sync + 'static> Stage<T> for DoOnNextStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        if self.done {
            return Signal::Complete;
        }
        match self.upstream.next(subscription).await {
            Signal::Next(value) => {
                match catch_unwind(AssertUnwindSafe(|| (self.observer)(&value))) {
                    Ok(()) => Signal::Next(value),
                    Err(payload) => {
                        self.done = true;
                        Signal::Error(StreamError::transform(format!(
                            "do_on_next observer panicked: {}",
                            panic_message(payload)
                        )))
                    }
                }
            }
            other => other,
        }
    }
}

/// Recipe for `Source::do_on_success`.
///
/// Tracks the last value seen at this point of the chain so the observer can
/// receive it on completion (`None` when the run completed empty).
pub(crate) struct DoOnSuccessProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    observer: SuccessObserver<T>,
}

impl<T> DoOnSuccessProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, observer: SuccessObserver<T>) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Clone + Send + Sync + 'static> Producer<T> for DoOnSuccessProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(DoOnSuccessStage {
            upstream: self.upstream.assemble(hooks),
            observer: Arc::clone(&self.observer),
            last: None,
        })
    }
}

struct DoOnSuccessStage<T> {
    upstream: BoxStage<T>,
    observer: SuccessObserver<T>,
    last: Option<T>,
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Stage<T> for DoOnSuccessStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        match self.upstream.next(subscription).await {
            Signal::Next(value) => {
                self.last = Some(value.clone());
                Signal::Next(value)
            }
            Signal::Complete => {
                match catch_unwind(AssertUnwindSafe(|| (self.observer)(self.last.as_ref()))) {
                    Ok(()) => Signal::Complete,
                    Err(payload) => Signal::Error(StreamError::transform(format!(
                        "do_on_success observer panicked: {}",
                        panic_message(payload)
                    ))),
                }
            }
            Signal::Error(err) => Signal::Error(err),
        }
    }
}

/// Recipe for `Source::do_on_error`.
pub(crate) struct DoOnErrorProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    observer: ErrorObserver,
}

impl<T> DoOnErrorProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, observer: ErrorObserver) -> Self {
        Self { upstream, observer }
    }
}

impl<T: Send + Sync + 'static> Producer<T> for DoOnErrorProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(DoOnErrorStage {
            upstream: self.upstream.assemble(hooks),
            observer: Arc::clone(&self.observer),
        })
    }
}

struct DoOnErrorStage<T> {
    upstream: BoxStage<T>,
    observer: ErrorObserver,
}

#[async_trait]
impl<T: Send + Sync + 'static> Stage<T> for DoOnErrorStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        match self.upstream.next(subscription).await {
            Signal::Error(err) => {
                // The run is already terminating with this error; an observer
                // panic here is swallowed so the original cause still lands.
                let _ = catch_unwind(AssertUnwindSafe(|| (self.observer)(&err)));
                Signal::Error(err)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sources::Source;
    use crate::subscription::UNBOUNDED;
    use crate::verify::Verifier;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_hooks_observe_without_altering_signals() {
        let subscribes = Arc::new(AtomicU64::new(0));
        let requests = Arc::new(AtomicU64::new(0));
        let nexts = Arc::new(AtomicU64::new(0));

        let on_subscribe = Arc::clone(&subscribes);
        let on_request = Arc::clone(&requests);
        let on_next = Arc::clone(&nexts);

        let source = Source::range(1, 3)
            .do_on_subscribe(move |_| {
                on_subscribe.fetch_add(1, Ordering::SeqCst);
            })
            .do_on_request(move |n| {
                on_request.fetch_add(n, Ordering::SeqCst);
            })
            .do_on_next(move |_| {
                on_next.fetch_add(1, Ordering::SeqCst);
            });

        Verifier::create(&source)
            .expect_next_seq([1, 2, 3])
            .verify_complete()
            .await;

        assert_eq!(subscribes.load(Ordering::SeqCst), 1);
        assert_eq!(requests.load(Ordering::SeqCst), UNBOUNDED);
        assert_eq!(nexts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_do_on_subscribe_fires_before_first_value() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let subscribe_log = Arc::clone(&order);
        let next_log = Arc::clone(&order);
        let source = Source::just(1i64)
            .do_on_subscribe(move |_| subscribe_log.lock().expect("order lock").push("subscribe"))
            .do_on_next(move |_| next_log.lock().expect("order lock").push("next"));

        Verifier::create(&source)
            .expect_next(1)
            .verify_complete()
            .await;
        assert_eq!(*order.lock().expect("order lock"), vec!["subscribe", "next"]);
    }

    #[tokio::test]
    async fn test_do_on_success_receives_last_value() {
        let captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        let source = Source::just("msg".to_string())
            .do_on_success(move |value| *sink.lock().expect("capture lock") = value.cloned());

        Verifier::create(&source)
            .expect_next("msg".to_string())
            .verify_complete()
            .await;
        assert_eq!(*captured.lock().expect("capture lock"), Some("msg".to_string()));
    }

    #[tokio::test]
    async fn test_do_on_success_sees_none_for_empty_run() {
        // flat_map to empty: completion carries no value, so the success
        // observer runs with no data.
        let observed = Arc::new(Mutex::new(Some("sentinel".to_string())));
        let sink = Arc::clone(&observed);
        let source = Source::just("msg".to_string())
            .flat_map(|_| Source::<String>::empty())
            .do_on_success(move |value| *sink.lock().expect("observe lock") = value.cloned());

        Verifier::create(&source).verify_complete().await;
        assert_eq!(*observed.lock().expect("observe lock"), None);
    }

    #[tokio::test]
    async fn test_do_on_error_sees_cause_and_next_is_skipped() {
        let labels = Arc::new(Mutex::new(Vec::new()));
        let nexts = Arc::new(AtomicU64::new(0));

        let label_sink = Arc::clone(&labels);
        let next_sink = Arc::clone(&nexts);
        let source = Source::<i64>::fail(StreamError::source("exception thrown"))
            .do_on_error(move |err| label_sink.lock().expect("label lock").push(err.as_label()))
            .do_on_next(move |_| {
                next_sink.fetch_add(1, Ordering::SeqCst);
            });

        Verifier::create(&source)
            .expect_error(ErrorKind::Source)
            .verify()
            .await;
        assert_eq!(*labels.lock().expect("label lock"), vec!["source"]);
        assert_eq!(nexts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_next_observer_surfaces_as_error() {
        let source = Source::range(1, 3).do_on_next(|n| {
            if *n == 2 {
                panic!("observer blew up");
            }
        });
        Verifier::create(&source)
            .expect_next(1)
            .expect_error(ErrorKind::Transform)
            .verify()
            .await;
    }
}
