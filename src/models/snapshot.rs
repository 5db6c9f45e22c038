//! Immutable view of one task as read from the scheduler.

use super::{GraphNodeInfo, TaskDefinition};

/// A task definition together with the relation data needed to walk past it.
///
/// For legacy task graphs `graph_node` holds the node metadata (dependents,
/// reruns); for task groups it is `None` and dependents come from the
/// paginated listing instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub definition: TaskDefinition,
    pub graph_node: Option<GraphNodeInfo>,
}

impl TaskSnapshot {
    pub fn new(task_id: impl Into<String>, definition: TaskDefinition) -> Self {
        Self {
            task_id: task_id.into(),
            definition,
            graph_node: None,
        }
    }

    pub fn with_graph_node(mut self, graph_node: GraphNodeInfo) -> Self {
        self.graph_node = Some(graph_node);
        self
    }

    pub fn dependents(&self) -> &[String] {
        self.graph_node
            .as_ref()
            .map(|n| n.dependents.as_slice())
            .unwrap_or_default()
    }

    pub fn reruns(&self) -> u32 {
        self.graph_node.as_ref().map(|n| n.reruns).unwrap_or(0)
    }
}
