//! In-process scheduler.
//!
//! Holds tasks, legacy graph nodes and graph info in memory and records every
//! write. Dependents for the listing API are derived from the `dependencies`
//! of stored tasks, in insertion order, and served in pages of `page_size`.
//!
//! ```rust
//! use serde_json::json;
//! use taskgraph_retrigger::models::TaskDefinition;
//! use taskgraph_retrigger::scheduler::{InMemoryScheduler, SchedulerClient};
//!
//! # tokio_test::block_on(async {
//! let scheduler = InMemoryScheduler::new().with_page_size(1);
//! scheduler.insert_task("build", TaskDefinition::from_value(json!({"dependencies": []})));
//! scheduler.insert_task("test", TaskDefinition::from_value(json!({"dependencies": ["build"]})));
//! scheduler.insert_task("lint", TaskDefinition::from_value(json!({"dependencies": ["build"]})));
//!
//! let first = scheduler.list_dependent_tasks("build", None, None).await.unwrap();
//! assert_eq!(first.task_ids().collect::<Vec<_>>(), vec!["test"]);
//!
//! let token = first.continuation_token.as_deref();
//! let second = scheduler.list_dependent_tasks("build", token, None).await.unwrap();
//! assert_eq!(second.task_ids().collect::<Vec<_>>(), vec!["lint"]);
//! assert!(second.continuation_token.is_none());
//! # });
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use super::SchedulerClient;
use crate::constants::operations;
use crate::error::{Result, RetriggerError};
use crate::models::{
    DependentTask, DependentsPage, GraphInfo, GraphNodeInfo, TaskDefinition, TaskGraphDocument,
};

#[derive(Debug, Default)]
struct State {
    task_order: Vec<String>,
    tasks: HashMap<String, TaskDefinition>,
    graphs: HashMap<String, GraphInfo>,
    graph_nodes: HashMap<(String, String), GraphNodeInfo>,
    created_tasks: Vec<(String, TaskDefinition)>,
    created_graphs: Vec<(String, TaskGraphDocument)>,
    dependents_requests: HashMap<String, usize>,
    task_fetches: HashMap<String, usize>,
    reject_tasks_after: Option<usize>,
    reject_graphs: bool,
}

#[derive(Debug)]
pub struct InMemoryScheduler {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for InMemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self {
            page_size: 1000,
            state: Mutex::new(State::default()),
        }
    }

    /// Serve at most `page_size` dependents per listing page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Reject every `create_task` once `count` tasks have been created
    pub fn reject_tasks_after(self, count: usize) -> Self {
        self.state.lock().reject_tasks_after = Some(count);
        self
    }

    pub fn reject_graphs(self) -> Self {
        self.state.lock().reject_graphs = true;
        self
    }

    pub fn insert_task(&self, task_id: impl Into<String>, task: TaskDefinition) {
        let task_id = task_id.into();
        let mut state = self.state.lock();
        if !state.tasks.contains_key(&task_id) {
            state.task_order.push(task_id.clone());
        }
        state.tasks.insert(task_id, task);
    }

    pub fn insert_graph(&self, graph_id: impl Into<String>, info: GraphInfo) {
        self.state.lock().graphs.insert(graph_id.into(), info);
    }

    pub fn insert_graph_node(&self, graph_id: impl Into<String>, node: GraphNodeInfo) {
        let key = (graph_id.into(), node.task_id.clone());
        self.state.lock().graph_nodes.insert(key, node);
    }

    /// Tasks created through `create_task`, in submission order
    pub fn created_tasks(&self) -> Vec<(String, TaskDefinition)> {
        self.state.lock().created_tasks.clone()
    }

    pub fn created_graphs(&self) -> Vec<(String, TaskGraphDocument)> {
        self.state.lock().created_graphs.clone()
    }

    /// Number of listing pages requested for `task_id`
    pub fn dependents_requests(&self, task_id: &str) -> usize {
        self.state
            .lock()
            .dependents_requests
            .get(task_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn task_fetches(&self, task_id: &str) -> usize {
        self.state
            .lock()
            .task_fetches
            .get(task_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SchedulerClient for InMemoryScheduler {
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDefinition> {
        let mut state = self.state.lock();
        *state.task_fetches.entry(task_id.to_string()).or_default() += 1;
        state
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| RetriggerError::not_found(task_id))
    }

    async fn fetch_graph_node(&self, graph_id: &str, task_id: &str) -> Result<GraphNodeInfo> {
        self.state
            .lock()
            .graph_nodes
            .get(&(graph_id.to_string(), task_id.to_string()))
            .cloned()
            .ok_or_else(|| RetriggerError::not_found(task_id))
    }

    async fn fetch_graph_info(&self, graph_id: &str) -> Result<GraphInfo> {
        self.state
            .lock()
            .graphs
            .get(graph_id)
            .cloned()
            .ok_or_else(|| RetriggerError::not_found(graph_id))
    }

    async fn list_dependent_tasks(
        &self,
        task_id: &str,
        continuation_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<DependentsPage> {
        let mut state = self.state.lock();
        *state
            .dependents_requests
            .entry(task_id.to_string())
            .or_default() += 1;

        let offset = match continuation_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                RetriggerError::InvalidResponse(format!("unknown continuation token '{token}'"))
            })?,
            None => 0,
        };
        let page_size = limit
            .map(|l| (l as usize).min(self.page_size))
            .unwrap_or(self.page_size)
            .max(1);

        let dependents: Vec<&String> = state
            .task_order
            .iter()
            .filter(|id| {
                state
                    .tasks
                    .get(*id)
                    .is_some_and(|t| t.dependencies().iter().any(|d| d == task_id))
            })
            .collect();

        let end = (offset + page_size).min(dependents.len());
        let tasks = dependents
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|id| DependentTask::new(id.as_str()))
            .collect();
        let continuation_token = (end < dependents.len()).then(|| end.to_string());

        debug!(
            task_id = task_id,
            offset = offset,
            end = end,
            total = dependents.len(),
            "Served dependents page"
        );

        Ok(DependentsPage {
            tasks,
            continuation_token,
        })
    }

    async fn create_task_graph(&self, graph_id: &str, graph: &TaskGraphDocument) -> Result<()> {
        let mut state = self.state.lock();
        if state.reject_graphs {
            return Err(RetriggerError::rejected(
                operations::CREATE_TASK_GRAPH,
                "graph rejected by scheduler",
            ));
        }

        for entry in &graph.tasks {
            let mut task = entry.task.clone();
            task.set_task_group_id(graph_id);
            if !state.tasks.contains_key(&entry.task_id) {
                state.task_order.push(entry.task_id.clone());
            }
            state.tasks.insert(entry.task_id.clone(), task);
        }
        state
            .created_graphs
            .push((graph_id.to_string(), graph.clone()));
        Ok(())
    }

    async fn create_task(&self, task_id: &str, task: &TaskDefinition) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(limit) = state.reject_tasks_after {
            if state.created_tasks.len() >= limit {
                return Err(RetriggerError::rejected(
                    operations::CREATE_TASK,
                    format!("task {task_id} rejected by scheduler"),
                ));
            }
        }

        state
            .created_tasks
            .push((task_id.to_string(), task.clone()));
        if !state.tasks.contains_key(task_id) {
            state.task_order.push(task_id.to_string());
        }
        state.tasks.insert(task_id.to_string(), task.clone());
        Ok(())
    }
}
