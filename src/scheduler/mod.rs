//! # Scheduler Collaborator
//!
//! The narrow contract the retrigger engine needs from the task scheduler.
//! Retry and backoff belong to implementations, not to the engine; every
//! error returned here ends the retrigger that triggered the call.
//!
//! - [`HttpSchedulerClient`] talks to the scheduler's queue and legacy
//!   task-graph HTTP APIs.
//! - [`InMemoryScheduler`] keeps everything in process, for tests and dry runs.

pub mod http;
pub mod memory;

pub use http::HttpSchedulerClient;
pub use memory::InMemoryScheduler;

use crate::error::Result;
use crate::models::{DependentsPage, GraphInfo, GraphNodeInfo, TaskDefinition, TaskGraphDocument};
use async_trait::async_trait;

#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Fetch a task definition; `NotFound` if the id is unknown
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDefinition>;

    /// Fetch a task's node in a legacy task graph; `NotFound` if the graph
    /// or the node does not exist
    async fn fetch_graph_node(&self, graph_id: &str, task_id: &str) -> Result<GraphNodeInfo>;

    /// Fetch graph-level tags and metadata for a legacy task graph
    async fn fetch_graph_info(&self, graph_id: &str) -> Result<GraphInfo>;

    /// Fetch one page of the tasks depending on `task_id`. A response without
    /// a continuation token is the last page.
    async fn list_dependent_tasks(
        &self,
        task_id: &str,
        continuation_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<DependentsPage>;

    /// Atomically create a legacy task graph
    async fn create_task_graph(&self, graph_id: &str, graph: &TaskGraphDocument) -> Result<()>;

    /// Create a single task
    async fn create_task(&self, task_id: &str, task: &TaskDefinition) -> Result<()>;
}
