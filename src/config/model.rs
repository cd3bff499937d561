// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::{Graph, Task};
use crate::exec::command_task;
use crate::types::HumanDuration;

/// Flow file as read from TOML, before semantic validation.
///
/// ```toml
/// [flow]
/// name = "release"
/// timeout = "10m"
///
/// [task.build]
/// cmd = "cargo build --release"
///
/// [task.upload]
/// cmd = "./upload.sh"
/// after = ["build"]
/// timeout = "30s"
/// retry_interval = "5s"
/// ```
///
/// All sections are optional at parse time; validation requires at least one
/// task.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub flow: FlowSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[flow]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FlowSection {
    /// Name used in logs and errors. The loader falls back to the file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Deadline for the whole run; the run is cancelled when it passes.
    #[serde(default)]
    pub timeout: Option<HumanDuration>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Shell command to run.
    pub cmd: String,

    /// Tasks that must succeed before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-task deadline.
    #[serde(default)]
    pub timeout: Option<HumanDuration>,

    /// Retry a failing command at this interval until `timeout` passes.
    #[serde(default)]
    pub retry_interval: Option<HumanDuration>,
}

/// A validated flow file.
///
/// Construct through [`TryFrom<RawConfigFile>`] (see `validate.rs`) or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub flow: FlowSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(flow: FlowSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { flow, task }
    }

    pub fn name(&self) -> &str {
        self.flow.name.as_deref().unwrap_or("taskflow")
    }

    /// Build the task graph, with every task running its shell command.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new(self.name());

        for (name, tc) in self.task.iter() {
            let mut func = command_task(name, &tc.cmd);
            match (tc.retry_interval, tc.timeout) {
                (Some(interval), Some(timeout)) => {
                    func = func.retry_until_timeout(interval.0, timeout.0);
                }
                (None, Some(timeout)) => func = func.timeout(timeout.0),
                // Rejected by validation.
                (Some(_), None) | (None, None) => {}
            }

            graph.add(Task::new(name, func).with_dependencies(&tc.after));
        }

        graph
    }
}
