//! The signal vocabulary exchanged between a source and its subscriber.
//!
//! A run delivers zero or more `Next` signals followed by exactly one terminal
//! signal (`Complete` xor `Error`), unless it is cancelled first. Subscription
//! establishment is not a `Signal` variant: it carries the per-run handle, not
//! data, and is modeled as the [`Subscriber::on_subscribe`](crate::Subscriber::on_subscribe)
//! callback instead.

use crate::error::StreamError;

/// One element of a run's observable signal sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    /// A value, delivered against one unit of previously granted demand.
    Next(T),
    /// Successful end of the sequence. Terminal.
    Complete,
    /// Failed end of the sequence. Terminal.
    Error(StreamError),
}

impl<T> Signal<T> {
    /// Returns `true` for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

impl<T: std::fmt::Debug> Signal<T> {
    /// Renders the signal for diagnostics (verifier mismatch messages, logs).
    pub fn describe(&self) -> String {
        match self {
            Signal::Next(value) => format!("Next({value:?})"),
            Signal::Complete => "Complete".to_string(),
            Signal::Error(err) => format!("Error({}: {})", err.as_label(), err.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(!Signal::Next(1).is_terminal());
        assert!(Signal::<i64>::Complete.is_terminal());
        assert!(Signal::<i64>::Error(StreamError::source("x")).is_terminal());
    }

    #[test]
    fn test_describe_names_error_kind() {
        let sig = Signal::<i64>::Error(StreamError::transform("bad"));
        assert_eq!(sig.describe(), "Error(transform: bad)");
    }
}
