// src/dag/graph.rs

//! Task definitions and the graph builder that compiles them into a [`Flow`].

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::flow::{Flow, Node};
use crate::dag::task_fn::TaskFn;
use crate::dag::task_id::{TaskId, TaskIds};
use crate::errors::BuildError;

/// A named unit of work plus the tasks it waits for.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub func: TaskFn,
    /// Tasks that must succeed before this one starts.
    ///
    /// This is a set, so naming the same predecessor twice has no effect.
    pub dependencies: TaskIds,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, func: TaskFn) -> Self {
        Self {
            id: id.into(),
            func,
            dependencies: TaskIds::new(),
        }
    }

    /// Add a single predecessor.
    pub fn after(mut self, dependency: impl Into<TaskId>) -> Self {
        self.dependencies.insert(dependency);
        self
    }

    /// Add several predecessors.
    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies.extend(dependencies);
        self
    }
}

/// Collects task definitions before they are validated and compiled.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    tasks: Vec<Task>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a task and return its id so later tasks can depend on it.
    ///
    /// Nothing is validated until [`Graph::compile`].
    pub fn add(&mut self, task: Task) -> TaskId {
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate the definitions and build an executable [`Flow`].
    ///
    /// Checks, in order:
    /// - no task id is defined twice
    /// - every dependency names a defined task
    /// - a non-empty graph has at least one root
    /// - the dependency relation is acyclic
    pub fn compile(self) -> Result<Flow, BuildError> {
        let mut nodes: HashMap<TaskId, Node> = HashMap::with_capacity(self.tasks.len());

        for task in &self.tasks {
            if nodes.contains_key(&task.id) {
                return Err(BuildError::DuplicateTask(task.id.clone()));
            }
            nodes.insert(task.id.clone(), Node::new(task.func.clone()));
        }

        for task in &self.tasks {
            for dep in &task.dependencies {
                let Some(dep_node) = nodes.get_mut(dep) else {
                    return Err(BuildError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                };
                dep_node.targets.insert(task.id.clone());
            }
            // `dependencies` is a set, so this counts distinct predecessors.
            if let Some(node) = nodes.get_mut(&task.id) {
                node.required = task.dependencies.len();
            }
        }

        if !nodes.is_empty() && !nodes.values().any(|n| n.required == 0) {
            return Err(BuildError::EmptyRootSet);
        }

        validate_acyclic(&self.tasks)?;

        debug!(flow = %self.name, tasks = nodes.len(), "compiled flow");
        Ok(Flow::new(self.name, nodes))
    }
}

fn validate_acyclic(tasks: &[Task]) -> Result<(), BuildError> {
    // Edge direction: dependency -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for task in tasks {
        graph.add_node(task.id.as_str());
    }

    for task in tasks {
        for dep in &task.dependencies {
            graph.add_edge(dep.as_str(), task.id.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(BuildError::CyclicGraph {
            task: TaskId::new(cycle.node_id()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task::new(id, TaskFn::noop())
    }

    #[test]
    fn compiles_targets_and_required_counts() {
        let mut graph = Graph::new("demo");
        let a = graph.add(task("a"));
        let b = graph.add(task("b"));
        graph.add(task("c").after(&a).after(&b));
        graph.add(task("d").after(&a));

        let flow = graph.compile().unwrap();
        assert_eq!(flow.name(), "demo");
        assert_eq!(flow.len(), 4);
        assert_eq!(flow.root_ids().names(), vec!["a", "b"]);
        assert_eq!(flow.targets_of("a").unwrap().names(), vec!["c", "d"]);
        assert_eq!(flow.required_of("c"), Some(2));
        assert_eq!(flow.required_of("d"), Some(1));
    }

    #[test]
    fn repeated_dependency_counts_once() {
        let mut graph = Graph::new("dup-edge");
        graph.add(task("a"));
        graph.add(task("b").after("a").after("a").with_dependencies(["a"]));

        let flow = graph.compile().unwrap();
        assert_eq!(flow.required_of("b"), Some(1));
    }

    #[test]
    fn rejects_duplicate_task() {
        let mut graph = Graph::new("dup");
        graph.add(task("a"));
        graph.add(task("a"));

        assert_eq!(
            graph.compile().unwrap_err(),
            BuildError::DuplicateTask(TaskId::from("a"))
        );
    }

    #[test]
    fn rejects_unknown_dependency() {
        let mut graph = Graph::new("unknown");
        graph.add(task("a").after("ghost"));

        let err = graph.compile().unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownDependency {
                task: "a".into(),
                dependency: "ghost".into(),
            }
        );
        assert!(err.to_string().contains("unknown dependency 'ghost'"));
    }

    #[test]
    fn rejects_graph_without_roots() {
        let mut graph = Graph::new("loop");
        graph.add(task("a").after("b"));
        graph.add(task("b").after("a"));

        assert_eq!(graph.compile().unwrap_err(), BuildError::EmptyRootSet);
    }

    #[test]
    fn rejects_cycle_behind_a_root() {
        let mut graph = Graph::new("cycle");
        graph.add(task("root"));
        graph.add(task("x").after("root").after("y"));
        graph.add(task("y").after("x"));

        match graph.compile().unwrap_err() {
            BuildError::CyclicGraph { task } => {
                assert!(task == "x" || task == "y", "unexpected task {task}");
            }
            other => panic!("expected CyclicGraph, got {other:?}"),
        }
    }

    #[test]
    fn rejects_self_dependency() {
        let mut graph = Graph::new("self");
        graph.add(task("root"));
        graph.add(task("x").after("root").after("x"));

        assert!(matches!(
            graph.compile(),
            Err(BuildError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn empty_graph_compiles() {
        let flow = Graph::new("empty").compile().unwrap();
        assert!(flow.is_empty());
        assert!(flow.root_ids().is_empty());
    }
}
