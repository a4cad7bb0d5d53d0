//! Error types used by the stream engine and its callers.
//!
//! This module defines two main error enums:
//!
//! - [`StreamError`] — failures that travel the stream itself and terminate a
//!   run with a single `Error` signal (a failing source, or a transform that
//!   rejects a value).
//! - [`ProtocolError`] — caller misuse of the subscription protocol, returned
//!   synchronously from the offending call and never delivered downstream.
//!
//! Both types provide helper methods (`as_label`, `message`) for logging and
//! for matching in the verification harness.

use thiserror::Error;

/// Coarse classification of a [`StreamError`].
///
/// Used by the verification harness to match an expected failure without
/// comparing full messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source itself was configured (or decided) to fail.
    Source,
    /// A caller-supplied transformation rejected a value mid-stream.
    Transform,
}

/// # Failures carried by the stream.
///
/// A `StreamError` is delivered to the subscriber as the terminal `Error`
/// signal of a run. Once delivered, no further signal follows for that run.
///
/// There are two kinds, matching where the failure originated:
/// - [`StreamError::Source`] — the source produced the failure itself;
/// - [`StreamError::Transform`] — an operator's transformation rejected a value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The source failed on its own (e.g. a `Source::fail` recipe).
    #[error("source failed: {message}")]
    Source {
        /// Human-readable description of the failure.
        message: String,
    },
    /// A transformation supplied to an operator rejected its input.
    #[error("transform failed: {message}")]
    Transform {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl StreamError {
    /// Creates a source-originated error.
    pub fn source(message: impl Into<String>) -> Self {
        StreamError::Source {
            message: message.into(),
        }
    }

    /// Creates a transform-originated error.
    pub fn transform(message: impl Into<String>) -> Self {
        StreamError::Transform {
            message: message.into(),
        }
    }

    /// Returns the coarse [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::Source { .. } => ErrorKind::Source,
            StreamError::Transform { .. } => ErrorKind::Transform,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use fluxion::StreamError;
    ///
    /// assert_eq!(StreamError::source("boom").as_label(), "source");
    /// assert_eq!(StreamError::transform("bad input").as_label(), "transform");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Source { .. } => "source",
            StreamError::Transform { .. } => "transform",
        }
    }

    /// Returns the underlying failure message.
    pub fn message(&self) -> &str {
        match self {
            StreamError::Source { message } | StreamError::Transform { message } => message,
        }
    }
}

/// # Caller misuse of the subscription protocol.
///
/// Unlike [`StreamError`], a `ProtocolError` is never delivered as a stream
/// signal: it is returned synchronously from the offending call (it indicates
/// caller misuse, not stream failure).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// `request(n)` was called with `n == 0`; demand must be positive.
    #[error("requested demand must be positive (got {requested})")]
    InvalidDemand {
        /// The rejected demand amount.
        requested: u64,
    },
}

impl ProtocolError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolError::InvalidDemand { .. } => "invalid_demand",
        }
    }
}
