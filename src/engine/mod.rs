// src/engine/mod.rs

//! Execution engine for compiled flows.
//!
//! - [`execution`] holds the coordinator behind [`Flow::run`](crate::dag::Flow::run):
//!   it launches ready tasks, collects their results over a channel and
//!   propagates triggers to successors.
//! - [`cancel`] provides the cooperative [`CancelToken`].
//! - [`opts`] describes per-run options (logger, progress reporter, token).
//! - [`outcome`] contains the terminal error types of a run.

pub mod cancel;
pub mod execution;
pub mod opts;
pub mod outcome;

pub use cancel::{CancelCause, CancelToken};
pub use opts::{Opts, ProgressReporter};
pub use outcome::{FlowError, TaskError, was_canceled};
