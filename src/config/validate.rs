// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::{Graph, Task, TaskFn};
use crate::errors::{Result, TaskflowError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.flow, raw.task))
    }
}

/// Semantic checks on a parsed flow file.
///
/// This checks:
/// - there is at least one task
/// - every `cmd` is non-empty
/// - `retry_interval` is only used together with `timeout`
/// - the task graph compiles (known dependencies, no cycles)
///
/// Duration strings are already checked during deserialization.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_tasks(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskflowError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(TaskflowError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
        if task.retry_interval.is_some() && task.timeout.is_none() {
            return Err(TaskflowError::ConfigError(format!(
                "task '{}' sets `retry_interval` without `timeout`",
                name
            )));
        }
    }
    Ok(())
}

/// Compile the dependency structure with placeholder functions, so the file
/// is rejected with the same errors the engine would report.
fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let mut graph = Graph::new("validate");
    for (name, task) in cfg.task.iter() {
        graph.add(Task::new(name, TaskFn::noop()).with_dependencies(&task.after));
    }
    graph.compile()?;
    Ok(())
}
