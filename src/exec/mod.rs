// src/exec/mod.rs

//! Process execution.
//!
//! [`command`] turns a shell command into a [`TaskFn`](crate::dag::TaskFn)
//! using `tokio::process::Command`. This is what tasks from a flow file run.

pub mod command;

pub use command::command_task;
