//! Stdout diagnostics for every protocol event at one point of the chain.
//!
//! Diagnostics only: the operator passes every signal through unmodified and
//! never affects protocol correctness.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::signal::Signal;
use crate::sources::{BoxStage, Producer, RunHooks, Stage};
use crate::subscription::{Subscription, UNBOUNDED};

/// Recipe for `Source::log`.
pub(crate) struct LogProducer<T> {
    upstream: Arc<dyn Producer<T>>,
    label: Arc<str>,
}

impl<T> LogProducer<T> {
    pub(crate) fn new(upstream: Arc<dyn Producer<T>>, label: String) -> Self {
        Self {
            upstream,
            label: label.into(),
        }
    }
}

impl<T: Debug + Send + Sync + 'static> Producer<T> for LogProducer<T> {
    fn assemble(&self, hooks: &mut RunHooks) -> BoxStage<T> {
        let stage = self.upstream.assemble(hooks);

        let label = Arc::clone(&self.label);
        hooks.on_subscribe.push(Arc::new(move |_: &Subscription| {
            println!("[{label}] subscribe");
        }));

        let label = Arc::clone(&self.label);
        hooks.on_request.push(Arc::new(move |n: u64| {
            if n == UNBOUNDED {
                println!("[{label}] request demand=unbounded");
            } else {
                println!("[{label}] request demand={n}");
            }
        }));

        Box::new(LogStage {
            upstream: stage,
            label: Arc::clone(&self.label),
        })
    }
}

struct LogStage<T> {
    upstream: BoxStage<T>,
    label: Arc<str>,
}

#[async_trait]
impl<T: Debug + Send + Sync + 'static> Stage<T> for LogStage<T> {
    async fn next(&mut self, subscription: &Subscription) -> Signal<T> {
        let signal = self.upstream.next(subscription).await;
        match &signal {
            Signal::Next(value) => println!("[{}] next value={value:?}", self.label),
            Signal::Complete => println!("[{}] complete", self.label),
            Signal::Error(err) => println!("[{}] error err={err}", self.label),
        }
        signal
    }
}
