//! Response and request shapes exchanged with the scheduler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TaskDefinition;

/// Per-node metadata from a legacy task graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphNodeInfo {
    pub task_id: String,
    /// Tasks in the same graph that wait on this one
    pub dependents: Vec<String>,
    /// Tasks this one waits on
    pub requires: Vec<String>,
    pub reruns: u32,
}

/// Graph-level data carried over when re-assembling a legacy graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphInfo {
    pub task_graph_id: String,
    pub tags: Map<String, Value>,
    pub metadata: Value,
}

/// One page from the dependents listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependentsPage {
    pub tasks: Vec<DependentTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl DependentsPage {
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().filter_map(DependentTask::task_id)
    }
}

/// A dependents listing entry; the id is either top-level or under `status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependentTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DependentTaskStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependentTaskStatus {
    pub task_id: String,
}

impl DependentTask {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            status: None,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id
            .as_deref()
            .or_else(|| self.status.as_ref().map(|s| s.task_id.as_str()))
    }
}

/// A task entry inside a legacy graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphTaskEntry {
    pub task_id: String,
    pub requires: Vec<String>,
    pub reruns: u32,
    pub task: TaskDefinition,
}

/// Document submitted atomically to create a legacy task graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGraphDocument {
    pub scopes: Vec<String>,
    pub tags: Map<String, Value>,
    pub metadata: Value,
    pub tasks: Vec<GraphTaskEntry>,
}
