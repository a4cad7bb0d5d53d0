//! Closure-backed subscriber for ad-hoc consumption.

use async_trait::async_trait;

use crate::error::StreamError;
use crate::subscribers::Subscriber;
use crate::subscription::Subscription;

type NextFn<T> = Box<dyn Fn(T) + Send + Sync>;
type CompleteFn = Box<dyn Fn() + Send + Sync>;
type ErrorFn = Box<dyn Fn(StreamError) + Send + Sync>;
type SubscribeFn = Box<dyn Fn(&Subscription) + Send + Sync>;

/// Subscriber assembled from optional closures.
///
/// Every callback is optional. Without an explicit `subscribe` closure the
/// subscriber requests unbounded demand at subscribe time; providing one
/// replaces that default entirely (e.g. to request a bounded amount, or to
/// cancel immediately).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use fluxion::{FnSubscriber, Source};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let subscriber = Arc::new(
///         FnSubscriber::new()
///             .next(|v: i64| println!("value {v}"))
///             .complete(|| println!("done")),
///     );
///     Source::range(1, 3).subscribe(subscriber).await;
/// }
/// ```
pub struct FnSubscriber<T> {
    next: Option<NextFn<T>>,
    complete: Option<CompleteFn>,
    error: Option<ErrorFn>,
    subscribe: Option<SubscribeFn>,
}

impl<T: Send + 'static> FnSubscriber<T> {
    /// Creates a subscriber with no callbacks (drains with unbounded demand).
    pub fn new() -> Self {
        Self {
            next: None,
            complete: None,
            error: None,
            subscribe: None,
        }
    }

    /// Sets the value callback.
    pub fn next(mut self, f: impl Fn(T) + Send + Sync + 'static) -> Self {
        self.next = Some(Box::new(f));
        self
    }

    /// Sets the completion callback.
    pub fn complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    pub fn error(mut self, f: impl Fn(StreamError) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Replaces the default unbounded-demand subscribe behavior.
    pub fn subscribe(mut self, f: impl Fn(&Subscription) + Send + Sync + 'static) -> Self {
        self.subscribe = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl<T: Send + 'static> Subscriber<T> for FnSubscriber<T> {
    async fn on_subscribe(&self, subscription: &Subscription) {
        match &self.subscribe {
            Some(f) => f(subscription),
            None => subscription.request_unbounded(),
        }
    }

    async fn on_next(&self, value: T) {
        if let Some(f) = &self.next {
            f(value);
        }
    }

    async fn on_complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }

    async fn on_error(&self, error: StreamError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }

    fn name(&self) -> &'static str {
        "fn_subscriber"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Source;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_default_subscribe_drains_everything() {
        let completions = Arc::new(AtomicU64::new(0));
        let values = Arc::new(AtomicU64::new(0));

        let complete_sink = Arc::clone(&completions);
        let value_sink = Arc::clone(&values);
        let subscriber = Arc::new(
            FnSubscriber::new()
                .next(move |_: i64| {
                    value_sink.fetch_add(1, Ordering::SeqCst);
                })
                .complete(move || {
                    complete_sink.fetch_add(1, Ordering::SeqCst);
                }),
        );
        Source::range(1, 4).subscribe(subscriber).await;

        assert_eq!(values.load(Ordering::SeqCst), 4);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_subscribe_replaces_default_demand() {
        // Cancel straight from on_subscribe: nothing is ever delivered.
        let values = Arc::new(AtomicU64::new(0));
        let value_sink = Arc::clone(&values);
        let subscriber = Arc::new(
            FnSubscriber::new()
                .subscribe(Subscription::cancel)
                .next(move |_: i64| {
                    value_sink.fetch_add(1, Ordering::SeqCst);
                }),
        );
        Source::range(1, 4).subscribe(subscriber).await;
        assert_eq!(values.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_callback_receives_cause() {
        let labels = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&labels);
        let subscriber = Arc::new(FnSubscriber::new().error(move |err: StreamError| {
            sink.lock().expect("label lock").push(err.as_label());
        }));
        Source::<i64>::fail(StreamError::source("boom"))
            .subscribe(subscriber)
            .await;
        assert_eq!(*labels.lock().expect("label lock"), vec!["source"]);
    }
}
