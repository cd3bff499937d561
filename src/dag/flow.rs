// src/dag/flow.rs

use std::collections::HashMap;
use std::fmt;

use crate::dag::graph::{Graph, Task};
use crate::dag::task_fn::TaskFn;
use crate::dag::task_id::{TaskId, TaskIds};
use crate::errors::BuildError;

/// Compiled form of a task: who it triggers, how many predecessors it waits
/// for, and its work function.
#[derive(Clone)]
pub struct Node {
    pub(crate) targets: TaskIds,
    pub(crate) required: usize,
    pub(crate) func: TaskFn,
}

impl Node {
    pub(crate) fn new(func: TaskFn) -> Self {
        Self {
            targets: TaskIds::new(),
            required: 0,
            func,
        }
    }

    pub fn targets(&self) -> &TaskIds {
        &self.targets
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn func(&self) -> &TaskFn {
        &self.func
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{{targets={:?}, required={}}}", self.targets, self.required)
    }
}

/// A validated, acyclic task graph that can be run any number of times.
///
/// Nothing in a `Flow` changes after construction, so a single value can be
/// shared between concurrent runs.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    nodes: HashMap<TaskId, Node>,
}

impl Flow {
    pub(crate) fn new(name: String, nodes: HashMap<TaskId, Node>) -> Self {
        Self { name, nodes }
    }

    /// Shorthand for adding every task to a [`Graph`] and compiling it.
    pub fn from_tasks(
        name: impl Into<String>,
        tasks: impl IntoIterator<Item = Task>,
    ) -> Result<Self, BuildError> {
        let mut graph = Graph::new(name);
        for task in tasks {
            graph.add(task);
        }
        graph.compile()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks in the flow.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn task_ids(&self) -> TaskIds {
        self.nodes.keys().cloned().collect()
    }

    /// Tasks without predecessors.
    pub fn root_ids(&self) -> TaskIds {
        self.nodes
            .iter()
            .filter(|(_, node)| node.required == 0)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Direct successors of a task.
    pub fn targets_of(&self, id: &str) -> Option<&TaskIds> {
        self.nodes.get(id).map(|n| &n.targets)
    }

    /// Number of distinct predecessors of a task.
    pub fn required_of(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).map(|n| n.required)
    }
}
