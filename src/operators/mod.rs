//! Operator stages: composable transformations over an upstream source.
//!
//! Each operator is a struct holding an upstream recipe plus a transform or
//! observer value (composed ownership; the chain is acyclic by construction).
//! Per-run state lives in the stage assembled for each subscription, never in
//! the recipe itself.
//!
//! ## Contents
//! - [`map`]: value transformation, 1:1 demand passthrough;
//! - [`flat_map`]: expand each value into an inner source, drained in order;
//! - [`recover`]: `on_error_resume` / `on_error_return` one-shot recovery;
//! - [`hooks`]: `do_on_*` side-effect observers;
//! - [`log`]: stdout protocol diagnostics.
//!
//! Operators are applied through the methods on
//! [`Source`](crate::sources::Source); nothing here is public API.

mod flat_map;
mod hooks;
mod log;
mod map;
mod recover;

pub(crate) use flat_map::FlatMapProducer;
pub(crate) use hooks::{
    DoOnErrorProducer, DoOnNextProducer, DoOnRequestProducer, DoOnSubscribeProducer,
    DoOnSuccessProducer,
};
pub(crate) use log::LogProducer;
pub(crate) use map::MapProducer;
pub(crate) use recover::{ResumeProducer, ReturnProducer};
