//! Error recovery: terminal substitution and fallback-value return.
//!
//! Both operators are one-shot by construction: `Error` occurs at most once
//! per run, so whichever recovery sits closest to the failure consumes it and
//! later recovery stages in the chain never observe an error.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::sources::{BoxStage, Producer, RunHooks, Source, Stage};
use crate::subscription::Subscription;

type Fallback<T> = Arc<dyn Fn(&StreamError) -> Source<T> + Send + Sync>;

/// Recipe for `Source::on_error_resume`.
pub(crate) struct ResumeProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    fallback: Fallback<T>,
}

impl<T> ResumeProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, fallback: Fallback<T>) -> Self {
        Self { upstream, fallback }
    }
}

impl<T: Send + Sync + 'static> Producer<T> for ResumeProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(ResumeStage {
            upstream: self.upstream.assemble(hooks),
            fallback: Arc::clone(&self.fallback),
            replacement: None,
        })
    }
}

struct ResumeStage<T> {
    upstream: BoxStage<T>,
    fallback: Fallback<T>,
    replacement: Option<BoxStage<T>>,
}

#[async_trait]
impl<T: Send + Sync + 'static> Stage<T> for ResumeStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        if let Some(replacement) = self.replacement.as_mut() {
            return replacement.next(subscription).await;
        }
        match self.upstream.next(subscription).await {
            Signal::Error(err) => {
                // Terminal substitution: the original stream is abandoned and
                // the replacement continues the run.
                let replacement = (self.fallback)(&err);
                let mut stage = replacement.assemble_run(subscription);
                let signal = stage.next(subscription).await;
                self.replacement = Some(stage);
                signal
            }
            other => other,
        }
    }
}

/// Recipe for `Source::on_error_return`.
pub(crate) struct ReturnProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    value: T,
}

impl<T> ReturnProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, value: T) -> Self {
        Self { upstream, value }
    }
}

impl<T: Clone + Send + Sync + 'static> Producer<T> for ReturnProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        Box::new(ReturnStage {
            upstream: self.upstream.assemble(hooks),
            value: self.value.clone(),
            pending_complete: false,
        })
    }
}

struct ReturnStage<T> {
    upstream: BoxStage<T>,
    value: T,
    pending_complete: bool,
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Stage<T> for ReturnStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        if self.pending_complete {
            return Signal::Complete;
        }
        match self.upstream.next(subscription).await {
            Signal::Error(_) => {
                // The cause is swallowed: fallback value, then Complete. The
                // upstream Error needed no demand, but the fallback is an
                // ordinary value and must claim a unit like any other.
                self.pending_complete = true;
                subscription.acquire().await;
                Signal::Next(self.value.clone())
            }
            other => other,
        }
    }
}
