//! Expansion of each value into an inner source, drained in order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::signal::Signal;
use crate::sources::{BoxStage, Producer, RunHooks, Source, Stage};
use crate::subscription::Subscription;

type Expand<T, U> = Arc<dyn Fn(T) -> Source<U> + Send + Sync>;

/// Recipe for `Source::flat_map`.
///
/// Each upstream value is expanded into an inner source that is fully drained
/// before the next upstream value is pulled. The upstream chain and the inner
/// runs are paced by this stage through a private free-running subscription;
/// downstream demand is claimed once per value the stage actually emits.
pub(crate) struct FlatMapProducer<T, U> {
    upstream: Arc<dyn Producer<T>>,
    expand: Expand<T, U>,
}

impl<T, U> FlatMapProducer<T, U> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, expand: Expand<T, U>) -> Self {
        Self { upstream, expand }
    }
}

impl<T, U> Producer<U> for FlatMapProducer<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<U> {
        // Upstream leaves must not park on downstream demand: an outer pull
        // yields no downstream value by itself, so it pulls against this
        // private subscription instead. Pull pacing is all the throttling the
        // upstream chain needs.
        let upstream_demand = Subscription::new();
        upstream_demand.request_unbounded();
        Box::new(FlatMapStage {
            outer: self.upstream.assemble(hooks),
            upstream_demand,
            expand: Arc::clone(&self.expand),
            inner: None,
            done: false,
        })
    }
}

struct FlatMapStage<T, U> {
    outer: BoxStage<T>,
    upstream_demand: Subscription,
    expand: Expand<T, U>,
    inner: Option<BoxStage<U>>,
    done: bool,
}

#[async_trait]
impl<T, U> Stage<U> for FlatMapStage<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    async fn next(&mut self, subscription: &Subscription) -> Signal<U> {
        if self.done {
            return Signal::Complete;
        }
        loop {
            if let Some(inner) = self.inner.as_mut() {
                match inner.next(&self.upstream_demand).await {
                    Signal::Next(value) => {
                        // One downstream demand unit per emitted value.
                        subscription.acquire().await;
                        return Signal::Next(value);
                    }
                    // Inner drained; an empty inner contributed no value at
                    // all for that element. Resume outer pulls.
                    Signal::Complete => self.inner = None,
                    Signal::Error(err) => {
                        self.done = true;
                        return Signal::Error(err);
                    }
                }
                continue;
            }

            match self.outer.next(&self.upstream_demand).await {
                Signal::Next(value) => {
                    let inner = (self.expand)(value);
                    self.inner = Some(inner.assemble_run(&self.upstream_demand));
                }
                Signal::Complete => {
                    self.done = true;
                    return Signal::Complete;
                }
                Signal::Error(err) => {
                    self.done = true;
                    return Signal::Error(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StreamError};
    use crate::verify::Verifier;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_flat_map_expands_in_order() {
        let source =
            Source::from_iter(vec![1i64, 2]).flat_map(|v| Source::from_iter(vec![v, v * 10]));
        Verifier::create(&source)
            .expect_next_seq([1, 10, 2, 20])
            .verify_complete()
            .await;
    }

    #[tokio::test]
    async fn test_flat_map_drains_under_bounded_demand() {
        // Quantum 1 is the tightest possible pacing: every value must wait
        // for its own request. Outer pulls consume no downstream demand, so
        // the run still drains to completion.
        let source =
            Source::from_iter(vec![1i64, 2]).flat_map(|v| Source::from_iter(vec![v, v * 10]));
        Verifier::create_bounded(&source, 1)
            .expect_next_seq([1, 10, 2, 20])
            .verify_complete()
            .await;
    }

    #[tokio::test]
    async fn test_flat_map_to_empty_completes_under_bounded_demand() {
        let source = Source::from_iter(vec![1i64, 2, 3]).flat_map(|_| Source::<i64>::empty());
        Verifier::create_bounded(&source, 1).verify_complete().await;
    }

    #[tokio::test]
    async fn test_flat_map_to_empty_yields_only_complete() {
        let source = Source::just(7i64).flat_map(|_| Source::<i64>::empty());
        Verifier::create(&source).verify_complete().await;
    }

    #[tokio::test]
    async fn test_flat_map_to_empty_suppresses_downstream_next_observer() {
        // No value flows out of the empty inner sequence, so a do_on_next
        // placed after the flat_map is never invoked. Intended behavior.
        let invocations = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&invocations);
        let source = Source::just("message".to_string())
            .flat_map(|_| Source::<String>::empty())
            .do_on_next(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        Verifier::create(&source).verify_complete().await;
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flat_map_inner_error_short_circuits() {
        let source = Source::from_iter(vec![1i64, 2, 3]).flat_map(|v| {
            if v == 2 {
                Source::fail(StreamError::source("inner failed"))
            } else {
                Source::just(v)
            }
        });
        Verifier::create(&source)
            .expect_next(1)
            .expect_error(ErrorKind::Source)
            .verify()
            .await;
    }

    #[tokio::test]
    async fn test_flat_map_outer_error_short_circuits() {
        let source =
            Source::<i64>::fail(StreamError::source("outer failed")).flat_map(Source::just);
        Verifier::create(&source)
            .expect_error(ErrorKind::Source)
            .verify()
            .await;
    }
}
