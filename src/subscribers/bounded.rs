//! Fixed-quantum demand: a steady-state pipeline depth of exactly `k`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::StreamError;
use crate::subscribers::Subscriber;
use crate::subscription::Subscription;

/// Wraps any subscriber and drives demand in fixed quanta.
///
/// Requests `quantum` on subscribe, then another `quantum` after every
/// `quantum` received values: the producer always runs at most `quantum`
/// values ahead of the consumer. The wrapped subscriber's own `on_subscribe`
/// is not invoked (this wrapper owns the demand policy); values and terminal
/// callbacks delegate unchanged.
///
/// A sequence of length `m` is drained with `ceil(m / quantum)` batches, each
/// of at most `quantum` values.
pub struct BoundedSubscriber<T> {
    inner: Arc<dyn Subscriber<T>>,
    quantum: u64,
    received: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl<T: Send + 'static> BoundedSubscriber<T> {
    /// Wraps `inner` with a demand quantum of `quantum` (clamped to >= 1).
    pub fn new(inner: Arc<dyn Subscriber<T>>, quantum: u64) -> Self {
        Self {
            inner,
            quantum: quantum.max(1),
            received: AtomicU64::new(0),
            subscription: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Subscriber<T> for BoundedSubscriber<T> {
    async fn on_subscribe(&self, subscription: &Subscription) {
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription.clone());
        // quantum >= 1, so this cannot fail.
        let _ = subscription.request(self.quantum);
    }

    async fn on_next(&self, value: T) {
        self.inner.on_next(value).await;
        let received = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        if received % self.quantum == 0 {
            let subscription = self
                .subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(subscription) = subscription {
                let _ = subscription.request(self.quantum);
            }
        }
    }

    async fn on_complete(&self) {
        self.inner.on_complete().await;
    }

    async fn on_error(&self, error: StreamError) {
        self.inner.on_error(error).await;
    }

    fn name(&self) -> &'static str {
        "bounded_subscriber"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Source;
    use crate::subscribers::FnSubscriber;

    #[tokio::test]
    async fn test_drains_sequence_in_quanta() {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let inner = Arc::new(FnSubscriber::new().next(move |v: i64| {
            sink.lock().expect("value lock").push(v);
        }));

        Source::range(1, 10)
            .subscribe(Arc::new(BoundedSubscriber::new(inner, 2)))
            .await;

        assert_eq!(
            *values.lock().expect("value lock"),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
        );
    }

    #[tokio::test]
    async fn test_request_arithmetic_for_partial_final_batch() {
        // m = 9, k = 2: all values arrive with ceil(9/2) = 5 request calls,
        // each granting exactly the quantum.
        let requests = Arc::new(Mutex::new(Vec::new()));
        let request_log = Arc::clone(&requests);
        let source = Source::range(1, 9).do_on_request(move |n| {
            request_log.lock().expect("request lock").push(n);
        });

        let received = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&received);
        let inner = Arc::new(FnSubscriber::new().next(move |_: i64| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        source
            .subscribe(Arc::new(BoundedSubscriber::new(inner, 2)))
            .await;

        assert_eq!(received.load(Ordering::SeqCst), 9);
        assert_eq!(*requests.lock().expect("request lock"), vec![2, 2, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_quantum_of_one_still_drains() {
        let received = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&received);
        let inner = Arc::new(FnSubscriber::new().next(move |_: i64| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        Source::range(1, 5)
            .subscribe(Arc::new(BoundedSubscriber::new(inner, 1)))
            .await;
        assert_eq!(received.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_cancel_after_first_value_stops_stream() {
        struct CancelAfterFirst {
            seen: AtomicU64,
            terminals: AtomicU64,
            subscription: Mutex<Option<Subscription>>,
        }

        #[async_trait]
        impl Subscriber<i64> for CancelAfterFirst {
            async fn on_subscribe(&self, subscription: &Subscription) {
                *self.subscription.lock().expect("sub lock") = Some(subscription.clone());
                subscription.request_unbounded();
            }

            async fn on_next(&self, _value: i64) {
                self.seen.fetch_add(1, Ordering::SeqCst);
                if let Some(subscription) = &*self.subscription.lock().expect("sub lock") {
                    subscription.cancel();
                }
            }

            async fn on_complete(&self) {
                self.terminals.fetch_add(1, Ordering::SeqCst);
            }

            async fn on_error(&self, _error: StreamError) {
                self.terminals.fetch_add(1, Ordering::SeqCst);
            }
        }

        let subscriber = Arc::new(CancelAfterFirst {
            seen: AtomicU64::new(0),
            terminals: AtomicU64::new(0),
            subscription: Mutex::new(None),
        });
        Source::range(1, 100)
            .subscribe(subscriber.clone() as Arc<dyn Subscriber<i64>>)
            .await;

        // Exactly one value, zero signals of any kind afterwards.
        assert_eq!(subscriber.seen.load(Ordering::SeqCst), 1);
        assert_eq!(subscriber.terminals.load(Ordering::SeqCst), 0);
    }
}
