//! Types exchanged with the retrigger orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DuplicationNode, GraphInfo};

/// Which of the scheduler's two graph representations a task lives in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Representation {
    /// Legacy task graph, submitted atomically
    Graph {
        #[serde(rename = "graphId")]
        graph_id: String,
    },
    /// Task group, submitted task by task
    Group,
}

impl Representation {
    pub fn label(&self) -> &'static str {
        match self {
            Representation::Graph { .. } => "graph",
            Representation::Group => "group",
        }
    }
}

/// An operator's request to re-run one task and everything depending on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetriggerRequest {
    pub task_id: String,
    /// Scopes the requester is authorized for; carried onto a new legacy graph
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Explicit representation; when absent it is inferred from the scheduler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation: Option<Representation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

impl RetriggerRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            scopes: Vec::new(),
            representation: None,
            requested_by: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = Some(representation);
        self
    }

    pub fn with_requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.requested_by = Some(requested_by.into());
        self
    }
}

/// Everything needed to submit a retrigger, computed without any writes.
///
/// `nodes` are in discovery order, already rewritten with new identifiers
/// (and, for groups, carrying the new group id).
#[derive(Debug, Clone)]
pub struct RetriggerPlan {
    pub task_id: String,
    pub representation: Representation,
    /// New graph id (legacy) or new group id
    pub new_graph_id: String,
    pub scopes: Vec<String>,
    pub nodes: Vec<DuplicationNode>,
    /// Original graph tags and metadata; legacy graphs only
    pub graph_info: Option<GraphInfo>,
}

impl RetriggerPlan {
    /// New id of the retriggered task itself
    pub fn new_task_id(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.old_id == self.task_id)
            .map(|n| n.new_id.as_str())
    }

    pub fn task_mapping(&self) -> BTreeMap<String, String> {
        self.nodes
            .iter()
            .map(|n| (n.old_id.clone(), n.new_id.clone()))
            .collect()
    }
}

/// What a retrigger produced, as reported back to the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetriggerOutcome {
    pub task_id: String,
    pub representation: Representation,
    pub new_graph_id: String,
    pub new_task_id: String,
    /// Original id → duplicate id for every duplicated task
    pub task_mapping: BTreeMap<String, String>,
    /// `false` for dry runs
    pub submitted: bool,
}
