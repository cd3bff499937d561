// src/engine/outcome.rs

//! Terminal outcomes of a flow run.

use std::error::Error as StdError;

use thiserror::Error;

use crate::dag::TaskId;
use crate::engine::cancel::CancelCause;

/// A task function's own error, tagged with the task that returned it.
#[derive(Debug, Error)]
#[error("task '{task}' failed: {cause:#}")]
pub struct TaskError {
    task: TaskId,
    cause: anyhow::Error,
}

impl TaskError {
    pub fn new(task: TaskId, cause: anyhow::Error) -> Self {
        Self { task, cause }
    }

    pub fn task(&self) -> &TaskId {
        &self.task
    }

    /// The error exactly as the task function returned it.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

/// Why a run did not succeed.
#[derive(Debug, Error)]
pub enum FlowError {
    /// At least one task failed and the run was not cancelled.
    #[error("flow '{name}' encountered task errors: [{}]", join_task_errors(.task_errors))]
    Failed {
        name: String,
        task_errors: Vec<TaskError>,
    },

    /// Cancellation was observed during the run. `task_errors` holds whatever
    /// failed before the run drained, and may be empty.
    #[error("flow '{name}' was canceled: {cause}{}", task_errors_suffix(.task_errors))]
    Canceled {
        name: String,
        cause: CancelCause,
        task_errors: Vec<TaskError>,
    },
}

impl FlowError {
    pub fn name(&self) -> &str {
        match self {
            FlowError::Failed { name, .. } | FlowError::Canceled { name, .. } => name,
        }
    }

    pub fn was_canceled(&self) -> bool {
        matches!(self, FlowError::Canceled { .. })
    }

    pub fn cancel_cause(&self) -> Option<&CancelCause> {
        match self {
            FlowError::Canceled { cause, .. } => Some(cause),
            FlowError::Failed { .. } => None,
        }
    }

    /// Every task error, in the order the coordinator received them.
    pub fn task_errors(&self) -> &[TaskError] {
        match self {
            FlowError::Failed { task_errors, .. } | FlowError::Canceled { task_errors, .. } => {
                task_errors
            }
        }
    }

    /// The unwrapped errors returned by the failed task functions.
    pub fn causes(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.task_errors().iter().map(TaskError::cause)
    }

    /// Ids of the tasks that failed.
    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskId> {
        self.task_errors().iter().map(TaskError::task)
    }
}

/// Whether `err`, or any error in its source chain, is a cancelled run.
///
/// Useful for callers that have already folded the [`FlowError`] into an
/// `anyhow::Error`:
///
/// ```ignore
/// if was_canceled(err.as_ref()) { ... }
/// ```
pub fn was_canceled(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(flow_err) = e.downcast_ref::<FlowError>() {
            return flow_err.was_canceled();
        }
        current = e.source();
    }
    false
}

fn join_task_errors(errors: &[TaskError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn task_errors_suffix(errors: &[TaskError]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(". Encountered task errors: [{}]", join_task_errors(errors))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    fn task_error(task: &str, msg: &str) -> TaskError {
        TaskError::new(task.into(), anyhow!(msg.to_string()))
    }

    #[test]
    fn failed_lists_every_task_error() {
        let err = FlowError::Failed {
            name: "deploy".into(),
            task_errors: vec![task_error("a", "boom"), task_error("b", "bang")],
        };

        assert!(!err.was_canceled());
        assert_eq!(err.name(), "deploy");
        assert_eq!(
            err.to_string(),
            "flow 'deploy' encountered task errors: [task 'a' failed: boom; task 'b' failed: bang]"
        );
        let causes: Vec<String> = err.causes().map(|c| c.to_string()).collect();
        assert_eq!(causes, vec!["boom", "bang"]);
    }

    #[test]
    fn canceled_without_task_errors() {
        let err = FlowError::Canceled {
            name: "deploy".into(),
            cause: CancelCause::Canceled,
            task_errors: Vec::new(),
        };

        assert!(err.was_canceled());
        assert_eq!(err.cancel_cause(), Some(&CancelCause::Canceled));
        assert_eq!(err.to_string(), "flow 'deploy' was canceled: canceled");
    }

    #[test]
    fn was_canceled_sees_through_anyhow() {
        let err: anyhow::Error = FlowError::Canceled {
            name: "x".into(),
            cause: CancelCause::DeadlineExceeded,
            task_errors: vec![task_error("a", "late")],
        }
        .into();
        let err = err.context("running pipeline");

        assert!(was_canceled(err.as_ref()));
        assert!(!was_canceled(anyhow!("plain").as_ref()));
    }
}
