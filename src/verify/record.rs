//! Internal subscriber that records a run's observable signal sequence.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::subscribers::Subscriber;

/// Collects every delivered signal, in order, for later comparison.
///
/// Demand policy is left to the caller: standalone it drains unbounded (the
/// trait default); wrapped in a
/// [`BoundedSubscriber`](crate::subscribers::BoundedSubscriber) it records
/// under quantum demand.
pub(crate) struct Recorder<T> {
    signals: Mutex<Vec<Signal<T>>>,
}

impl<T> Recorder<T> {
    pub(crate) fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
        }
    }

    /// Takes the recorded sequence out of the recorder.
    pub(crate) fn take(&self) -> Vec<Signal<T>> {
        std::mem::take(
            &mut *self
                .signals
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn push(&self, signal: Signal<T>) {
        self.signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }
}

#[async_trait]
impl<T: Send + 'static> Subscriber<T> for Recorder<T> {
    async fn on_next(&self, value: T) {
        self.push(Signal::Next(value));
    }

    async fn on_complete(&self) {
        self.push(Signal::Complete);
    }

    async fn on_error(&self, error: StreamError) {
        self.push(Signal::Error(error));
    }

    fn name(&self) -> &'static str {
        "verifier_recorder"
    }
}
