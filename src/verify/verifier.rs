//! # Deterministic verification of a source's signal sequence.
//!
//! [`Verifier`] subscribes internally, records the run's signals, and
//! compares them against the scripted expectation. On the first point of
//! divergence it panics with a diagnostic naming the signal index, what was
//! expected, and what actually arrived (extra, missing, or mismatched value;
//! unexpected or missing terminal; wrong error kind).
//!
//! The harness drives unbounded demand unless a bounded variant is requested
//! with [`Verifier::create_bounded`], and times out rather than hangs when a
//! source never reaches a terminal signal.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::ErrorKind;
use crate::signal::Signal;
use crate::sources::Source;
use crate::subscribers::{BoundedSubscriber, Subscriber};
use crate::verify::record::Recorder;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

enum Expect<T> {
    Next(T),
    Error(ErrorKind),
    Complete,
}

impl<T: Debug> Expect<T> {
    fn describe(&self) -> String {
        match self {
            Expect::Next(value) => format!("Next({value:?})"),
            Expect::Error(kind) => format!("Error(kind {kind:?})"),
            Expect::Complete => "Complete".to_string(),
        }
    }
}

/// Scripted expectation against one run of a source.
///
/// # Example
/// ```
/// use fluxion::{Source, StreamError, Verifier};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let doubled = Source::range(1, 3).map(|n| Ok::<_, StreamError>(n * 2));
///     Verifier::create(&doubled)
///         .expect_next_seq([2, 4, 6])
///         .verify_complete()
///         .await;
/// }
/// ```
pub struct Verifier<T> {
    source: Source<T>,
    steps: Vec<Expect<T>>,
    quantum: Option<u64>,
    timeout: Duration,
}

impl<T> Verifier<T>
where
    T: Clone + PartialEq + Debug + Send + Sync + 'static,
{
    /// Scripts a verification driving unbounded demand.
    ///
    /// The source is cloned: verification is an independent cold run, and the
    /// original stays reusable.
    pub fn create(source: &Source<T>) -> Self {
        Self {
            source: source.clone(),
            steps: Vec::new(),
            quantum: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Scripts a verification driving bounded demand in quanta of `quantum`.
    pub fn create_bounded(source: &Source<T>, quantum: u64) -> Self {
        Self {
            quantum: Some(quantum),
            ..Self::create(source)
        }
    }

    /// Replaces the default 5 s terminal-signal timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expects `value` as the next signal.
    pub fn expect_next(mut self, value: T) -> Self {
        self.steps.push(Expect::Next(value));
        self
    }

    /// Expects `values`, in order, as the next signals.
    pub fn expect_next_seq(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.steps.extend(values.into_iter().map(Expect::Next));
        self
    }

    /// Expects the run to terminate with an error of the given kind.
    pub fn expect_error(mut self, kind: ErrorKind) -> Self {
        self.steps.push(Expect::Error(kind));
        self
    }

    /// Expects successful completion as the final signal, then verifies.
    ///
    /// # Panics
    /// On any divergence between expected and observed signals, or on
    /// timeout.
    pub async fn verify_complete(mut self) {
        self.steps.push(Expect::Complete);
        self.verify().await;
    }

    /// Subscribes, records the run, and asserts the scripted sequence.
    ///
    /// # Panics
    /// On any divergence between expected and observed signals, or on
    /// timeout.
    pub async fn verify(self) {
        let recorder = Arc::new(Recorder::new());
        let subscriber: Arc<dyn Subscriber<T>> = match self.quantum {
            Some(quantum) => Arc::new(BoundedSubscriber::new(recorder.clone(), quantum)),
            None => recorder.clone(),
        };

        if timeout(self.timeout, self.source.subscribe(subscriber))
            .await
            .is_err()
        {
            panic!(
                "verification timed out after {:?} waiting for a terminal signal",
                self.timeout
            );
        }

        compare(&self.steps, &recorder.take());
    }
}

fn compare<T: PartialEq + Debug>(expected: &[Expect<T>], actual: &[Signal<T>]) {
    for (index, step) in expected.iter().enumerate() {
        match (step, actual.get(index)) {
            (Expect::Next(want), Some(Signal::Next(got))) if got == want => {}
            (Expect::Complete, Some(Signal::Complete)) => {}
            (Expect::Error(kind), Some(Signal::Error(err))) if err.kind() == *kind => {}
            (step, Some(signal)) => panic!(
                "signal #{index} diverged: expected {}, got {}",
                step.describe(),
                signal.describe()
            ),
            (step, None) => panic!(
                "stream ended early at signal #{index}: expected {}, got nothing",
                step.describe()
            ),
        }
    }
    if let Some(extra) = actual.get(expected.len()) {
        panic!(
            "unexpected trailing signal #{}: {}",
            expected.len(),
            extra.describe()
        );
    }
}
