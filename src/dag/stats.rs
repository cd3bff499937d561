// src/dag/stats.rs

//! Progress bookkeeping for a single run.

use crate::dag::task_id::{TaskId, TaskIds};

/// Partition of every task of a run into its current state.
///
/// A task sits in exactly one of `succeeded`, `failed`, `running` and
/// `pending`; together they always make up `all`. A task whose predecessors
/// never all succeed stays in `pending` for good.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub all: TaskIds,
    pub succeeded: TaskIds,
    pub failed: TaskIds,
    pub running: TaskIds,
    pub pending: TaskIds,
}

impl Stats {
    /// Every id in `all` starts out pending.
    pub fn initial(all: TaskIds) -> Self {
        Self {
            pending: all.clone(),
            all,
            ..Self::default()
        }
    }

    /// `floor(100 * succeeded / all)`, or 0 for an empty run.
    pub fn progress_percent(&self) -> usize {
        if self.all.is_empty() {
            return 0;
        }
        100 * self.succeeded.len() / self.all.len()
    }

    pub(crate) fn mark_running(&mut self, id: &TaskId) {
        self.pending.remove(id.as_str());
        self.running.insert(id);
    }

    pub(crate) fn mark_succeeded(&mut self, id: &TaskId) {
        self.running.remove(id.as_str());
        self.succeeded.insert(id);
    }

    pub(crate) fn mark_failed(&mut self, id: &TaskId) {
        self.running.remove(id.as_str());
        self.failed.insert(id);
    }
}
