//! Value transformation with 1:1 demand passthrough.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::sources::{BoxStage, Producer, RunHooks, Stage};
use crate::subscription::Subscription;

type Transform<T, U> = Arc<dyn Fn(T) -> Result<U, StreamError> + Send + Sync>;

/// Recipe for `Source::map`.
///
/// Performs no backpressure transformation itself: one unit of downstream
/// demand is one unit of upstream demand.
pub(crate) struct MapProducer<T, U> {
    upstream: Arc<dyn Producer<T>>,
    transform: Transform<T, U>,
}

impl<T, U> MapProducer<T, U> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, transform: Transform<T, U>) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<T, U> Producer<U> for MapProducer<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<U> {
        Box::new(MapStage {
            upstream: self.upstream.assemble(hooks),
            transform: Arc::clone(&self.transform),
            done: false,
        })
    }
}

struct MapStage<T, U> {
    upstream: BoxStage<T>,
    transform: Transform<T, U>,
    done: bool,
}

#[async_trait]
impl<T, U> Stage<U> for MapStage<T, U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
{
    async fn next(&mut self, subscription: &Subscription) -> Signal<U> {
        if self.done {
            return Signal::Complete;
        }
        match self.upstream.next(subscription).await {
            Signal::Next(value) => match (self.transform)(value) {
                Ok(mapped) => Signal::Next(mapped),
                Err(err) => {
                    // Stop pulling upstream: the rejected value is suppressed
                    // and any pending Complete is skipped.
                    self.done = true;
                    Signal::Error(err)
                }
            },
            Signal::Complete => Signal::Complete,
            Signal::Error(err) => Signal::Error(err),
        }
    }
}
