//! # Per-run subscription handle: demand accounting and cancellation.
//!
//! A [`Subscription`] mediates between one source run and one subscriber. It
//! carries the run's outstanding demand (an unsigned counter saturating at the
//! [`UNBOUNDED`] sentinel), a one-way cancellation flag, and the run's
//! [`RunState`].
//!
//! ## Demand discipline
//! ```text
//! subscriber ── request(n) ──► demand += n (saturating) ──► wake producer
//! producer   ── claim(1)   ──► demand -= 1 (never below zero, never when
//!                              unbounded) before each value is produced
//! ```
//! `request` never delivers signals re-entrantly on the caller's stack: it
//! only credits demand and wakes the suspended producer (a trampoline), so
//! requesting from inside an `on_next` callback cannot grow the stack.
//!
//! ## Rules
//! - `request(0)` is caller misuse and fails synchronously with
//!   [`ProtocolError::InvalidDemand`]; it is never surfaced as a stream signal.
//! - After cancellation or a terminal signal, `request` is a silent no-op and
//!   demand is no longer consulted.
//! - `cancel` is one-way and idempotent; once it observably takes effect, no
//!   further signal is delivered to the owning subscriber.

use std::sync::{
    atomic::{AtomicU64, AtomicU8, Ordering},
    Arc, Mutex, PoisonError,
};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::ProtocolError;

/// Demand sentinel meaning "effectively unbounded".
///
/// Once outstanding demand saturates here it is never decremented again:
/// the producer is free-running for the rest of the run.
pub const UNBOUNDED: u64 = u64::MAX;

/// Observable lifecycle of one run.
///
/// `Cancelled` and `Terminated` are absorbing: once entered, the state never
/// changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// Subscription created, nothing produced yet.
    Idle = 0,
    /// The producer holds claimed demand and is emitting.
    Producing = 1,
    /// Outstanding demand reached zero; production is suspended until the
    /// next `request`.
    AwaitingDemand = 2,
    /// The subscriber cancelled the run.
    Cancelled = 3,
    /// A terminal signal was delivered.
    Terminated = 4,
}

impl RunState {
    fn decode(raw: u8) -> RunState {
        match raw {
            1 => RunState::Producing,
            2 => RunState::AwaitingDemand,
            3 => RunState::Cancelled,
            4 => RunState::Terminated,
            _ => RunState::Idle,
        }
    }

    fn is_final(self) -> bool {
        matches!(self, RunState::Cancelled | RunState::Terminated)
    }
}

pub(crate) type RequestObserver = Arc<dyn Fn(u64) + Send + Sync>;

struct SubscriptionInner {
    demand: AtomicU64,
    state: AtomicU8,
    token: CancellationToken,
    wake: Notify,
    request_observers: Mutex<Vec<RequestObserver>>,
}

/// Handle mediating demand and cancellation for exactly one run.
///
/// Cheap to clone (internally `Arc`-backed); all clones refer to the same run.
/// A subscription is created at subscribe time, lives for one run, and is
/// discarded once a terminal signal fires or cancellation occurs.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                demand: AtomicU64::new(0),
                state: AtomicU8::new(RunState::Idle as u8),
                token: CancellationToken::new(),
                wake: Notify::new(),
                request_observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Grants `n` more units of demand to the producer.
    ///
    /// Fails synchronously with [`ProtocolError::InvalidDemand`] if `n == 0`.
    /// After cancellation or a terminal signal this is a silent no-op.
    ///
    /// Safe to call from inside subscriber callbacks: the producer is resumed
    /// through its own suspended task, never re-entrantly on this stack.
    pub fn request(&self, n: u64) -> Result<(), ProtocolError> {
        if n == 0 {
            return Err(ProtocolError::InvalidDemand { requested: n });
        }
        if self.state().is_final() {
            return Ok(());
        }

        let observers: Vec<RequestObserver> = {
            let guard = self
                .inner
                .request_observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        for observer in observers {
            observer(n);
        }

        let mut current = self.inner.demand.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(n);
            match self.inner.demand.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.inner.wake.notify_one();
        Ok(())
    }

    /// Grants effectively unbounded demand (the fire-and-forget mode).
    pub fn request_unbounded(&self) {
        // UNBOUNDED is positive, so this cannot fail.
        let _ = self.request(UNBOUNDED);
    }

    /// Cancels the run. One-way and idempotent.
    ///
    /// No signal is delivered after cancellation observably takes effect; an
    /// in-flight callback may finish, but nothing follows it.
    pub fn cancel(&self) {
        self.set_state(RunState::Cancelled);
        self.inner.token.cancel();
        self.inner.wake.notify_one();
    }

    /// Returns `true` once [`cancel`](Subscription::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Current outstanding demand ([`UNBOUNDED`] once saturated).
    pub fn demand(&self) -> u64 {
        self.inner.demand.load(Ordering::Acquire)
    }

    /// Current [`RunState`] of the run.
    pub fn state(&self) -> RunState {
        RunState::decode(self.inner.state.load(Ordering::Acquire))
    }

    /// Resolves when the run is cancelled.
    pub(crate) async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Marks the run terminated (a terminal signal is about to be delivered).
    pub(crate) fn terminate(&self) {
        self.set_state(RunState::Terminated);
    }

    /// Installs `do_on_request` observers collected during run assembly.
    ///
    /// Observers are invoked synchronously on every successful `request`,
    /// before demand is credited. Inner runs (flatMap, error recovery) may
    /// install more observers mid-run.
    pub(crate) fn add_request_observers(&self, observers: Vec<RequestObserver>) {
        if observers.is_empty() {
            return;
        }
        self.inner
            .request_observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(observers);
    }

    /// Claims one unit of demand if any is outstanding.
    ///
    /// Unbounded demand is never decremented.
    pub(crate) fn try_claim(&self) -> bool {
        let mut current = self.inner.demand.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return true;
            }
            if current == 0 {
                return false;
            }
            match self.inner.demand.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Suspends until one unit of demand can be claimed.
    ///
    /// This is the cooperative scheduling point of the engine: the producing
    /// leaf parks here (`AwaitingDemand`) whenever outstanding demand reaches
    /// zero and is woken by the next `request`. Cancellation is handled by the
    /// driver, which races this future against the cancellation token.
    pub(crate) async fn acquire(&self) {
        loop {
            if self.try_claim() {
                self.set_state(RunState::Producing);
                return;
            }
            self.set_state(RunState::AwaitingDemand);
            self.inner.wake.notified().await;
        }
    }

    fn set_state(&self, next: RunState) {
        // Cancelled / Terminated are absorbing.
        let _ = self
            .inner
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                if RunState::decode(raw).is_final() {
                    None
                } else {
                    Some(next as u8)
                }
            });
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("demand", &self.demand())
            .field("state", &self.state())
            .finish()
    }
}
