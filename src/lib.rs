//! # fluxion
//!
//! **Fluxion** is a minimal reactive-streams execution engine for Rust.
//!
//! It provides cold asynchronous-sequence primitives connected through a
//! demand-driven subscription protocol with backpressure, error propagation,
//! and cancellation, plus a deterministic verification harness for testing
//! stream behavior.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────┐   operators    ┌────────────┐   ┌────────────┐
//!   │   Source   │ ─ map/flat_map │   Source   │...│   Source   │
//!   │  (recipe)  │   /recover/...─►  (recipe)  │   │  (recipe)  │
//!   └─────┬──────┘                └────────────┘   └─────┬──────┘
//!         │ subscribe(subscriber)                        │
//!         ▼                                              ▼
//!   ┌───────────────────────────────────────────────────────────┐
//!   │  one run = fresh stage chain + Subscription + driver loop │
//!   │                                                           │
//!   │   stage chain ──► driver ──► subscriber callbacks         │
//!   │        ▲            │             │                       │
//!   │        │          pulls        on_subscribe / on_next     │
//!   │   demand claimed  one signal   on_complete / on_error     │
//!   │   per value       at a time         │                     │
//!   │        │                            │ request(n) / cancel │
//!   │        └───────── Subscription ◄────┘                     │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Protocol
//! ```text
//! subscribe ──► on_subscribe(subscription)
//!                    │ request(n)
//!                    ▼
//!               on_next(v) ... one per granted unit, in source order
//!                    │
//!                    ├─► on_complete()          (success, terminal)
//!                    ├─► on_error(err)          (failure, terminal)
//!                    └─► cancel() ─► silence    (no further signal)
//! ```
//!
//! Sources are **cold**: each `subscribe` call is an independent, isolated
//! run with its own subscription and per-run operator state, replaying the
//! same sequence. At most one terminal signal is delivered per run, always
//! last.
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                      |
//! |-------------------|-----------------------------------------------------------|-----------------------------------------|
//! | **Sources**       | Cold sequence recipes: just, range, iterables, failures.  | [`Source`]                              |
//! | **Operators**     | map, flat_map, error recovery, side-effect hooks, log.    | methods on [`Source`]                   |
//! | **Backpressure**  | Demand-driven emission with an unbounded sentinel.        | [`Subscription`], [`UNBOUNDED`]         |
//! | **Subscribers**   | Consume signals; closure-backed and bounded variants.     | [`Subscriber`], [`FnSubscriber`], [`BoundedSubscriber`] |
//! | **Errors**        | Stream failures vs. protocol misuse.                      | [`StreamError`], [`ProtocolError`]      |
//! | **Verification**  | Scripted assertions over a run's signal sequence.         | [`Verifier`]                            |
//!
//! ## Example
//! ```rust
//! use fluxion::{Source, StreamError, Verifier};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let source = Source::range(1, 5)
//!         .map(|n| {
//!             if n == 3 {
//!                 Err(StreamError::transform("three is not allowed"))
//!             } else {
//!                 Ok(n * 10)
//!             }
//!         })
//!         .on_error_return(0);
//!
//!     Verifier::create(&source)
//!         .expect_next_seq([10, 20, 0])
//!         .verify_complete()
//!         .await;
//! }
//! ```

mod error;
mod operators;
mod signal;
mod sources;
mod subscribers;
mod subscription;
mod verify;

pub use error::{ErrorKind, ProtocolError, StreamError};
pub use signal::Signal;
pub use sources::Source;
pub use subscribers::{BoundedSubscriber, FnSubscriber, LogWriter, Subscriber};
pub use subscription::{RunState, Subscription, UNBOUNDED};
pub use verify::Verifier;
