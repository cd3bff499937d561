// src/dag/mod.rs

//! Task graph model.
//!
//! - [`task_id`] defines task identifiers and identifier sets.
//! - [`task_fn`] defines the work function of a task plus combinators.
//! - [`graph`] collects task definitions and compiles them into a [`Flow`],
//!   rejecting duplicates, unknown dependencies and cycles.
//! - [`flow`] holds the compiled, immutable graph.
//! - [`stats`] tracks which tasks of a run are pending, running or done.

pub mod flow;
pub mod graph;
pub mod stats;
pub mod task_fn;
pub mod task_id;

pub use flow::{Flow, Node};
pub use graph::{Graph, Task};
pub use stats::Stats;
pub use task_fn::{ParallelError, TaskFn, TaskFuture};
pub use task_id::{TaskId, TaskIds};
