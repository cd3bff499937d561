// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::dag::TaskId;
use crate::engine::FlowError;

/// Why a set of task definitions could not be compiled into a [`Flow`](crate::dag::Flow).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("task '{0}' is defined more than once")]
    DuplicateTask(TaskId),

    #[error("no task without dependencies; every task waits on another one")]
    EmptyRootSet,

    #[error("cycle detected in task graph involving task '{task}'")]
    CyclicGraph { task: TaskId },
}

#[derive(Error, Debug)]
pub enum TaskflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid task graph: {0}")]
    BuildError(#[from] BuildError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    FlowError(#[from] FlowError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskflowError>;
