//! Dependency graph for tasks
//!
//! Tracks which tasks depend on which, with cycle detection. The ranker
//! uses dependency fan-in (how many tasks depend on a given task) as a
//! priority signal.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(String, String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(String),
}

/// A dependency graph over task ids
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph; edges run dependency -> dependent
    graph: DiGraph<String, ()>,

    /// Map from task id to node index
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from a collection of tasks
    ///
    /// Dependencies on unknown tasks are skipped; the validation pass
    /// reports those separately.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        let tasks: Vec<_> = tasks.into_iter().collect();
        for task in &tasks {
            graph.add_task(&task.id);
        }

        for task in &tasks {
            for dep_id in &task.depends_on {
                if graph.node_map.contains_key(dep_id) {
                    graph.add_dependency(&task.id, dep_id)?;
                }
            }
        }

        Ok(graph)
    }

    /// Adds a task node to the graph
    pub fn add_task(&mut self, task_id: &str) {
        if !self.node_map.contains_key(task_id) {
            let idx = self.graph.add_node(task_id.to_string());
            self.node_map.insert(task_id.to_string(), idx);
        }
    }

    /// Adds a dependency edge: `task` depends on `depends_on`
    pub fn add_dependency(&mut self, task: &str, depends_on: &str) -> Result<(), GraphError> {
        if task == depends_on {
            return Err(GraphError::SelfDependency(task.to_string()));
        }

        let task_idx = *self
            .node_map
            .get(task)
            .ok_or_else(|| GraphError::TaskNotFound(task.to_string()))?;

        let dep_idx = *self
            .node_map
            .get(depends_on)
            .ok_or_else(|| GraphError::TaskNotFound(depends_on.to_string()))?;

        self.graph.add_edge(dep_idx, task_idx, ());

        if is_cyclic_directed(&self.graph) {
            if let Some(edge) = self.graph.find_edge(dep_idx, task_idx) {
                self.graph.remove_edge(edge);
            }
            return Err(GraphError::CycleDetected(
                task.to_string(),
                depends_on.to_string(),
            ));
        }

        Ok(())
    }

    /// Returns how many tasks depend on the given task (directly)
    pub fn fan_in(&self, task_id: &str) -> usize {
        match self.node_map.get(task_id) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, petgraph::Direction::Outgoing)
                .count(),
            None => 0,
        }
    }

    /// Returns the ids of tasks that depend on the given task
    pub fn dependents(&self, task_id: &str) -> Vec<String> {
        match self.node_map.get(task_id) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, petgraph::Direction::Outgoing)
                .filter_map(|i| self.graph.node_weight(i).cloned())
                .collect(),
            None => vec![],
        }
    }

    /// Returns the ids of tasks the given task depends on
    pub fn dependencies(&self, task_id: &str) -> Vec<String> {
        match self.node_map.get(task_id) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, petgraph::Direction::Incoming)
                .filter_map(|i| self.graph.node_weight(i).cloned())
                .collect(),
            None => vec![],
        }
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &str) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
