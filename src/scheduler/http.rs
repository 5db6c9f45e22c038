//! # HTTP Scheduler Client
//!
//! [`SchedulerClient`] over the scheduler's JSON HTTP APIs.
//!
//! Queue endpoints (relative to `queue_url`):
//! - `GET  task/{taskId}`
//! - `GET  task/{taskId}/dependents?continuationToken=..&limit=..`
//! - `PUT  task/{taskId}`
//!
//! Legacy task-graph endpoints (relative to `scheduler_url`):
//! - `GET  task-graph/{graphId}/inspect/{taskId}`
//! - `GET  task-graph/{graphId}/info`
//! - `PUT  task-graph/{graphId}`
//!
//! A 404 on a read is `NotFound`; any other failed read is a transport error.
//! A failed write is `SchedulerRejected`. Requests are not retried here.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::SchedulerClient;
use crate::config::SchedulerConfig;
use crate::constants::operations;
use crate::error::{Result, RetriggerError};
use crate::models::{DependentsPage, GraphInfo, GraphNodeInfo, TaskDefinition, TaskGraphDocument};

#[derive(Clone)]
pub struct HttpSchedulerClient {
    client: Client,
    queue_url: Url,
    scheduler_url: Url,
}

impl std::fmt::Debug for HttpSchedulerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSchedulerClient")
            .field("queue_url", &self.queue_url.as_str())
            .field("scheduler_url", &self.scheduler_url.as_str())
            .finish()
    }
}

impl HttpSchedulerClient {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let queue_url = parse_base_url("queue_url", &config.queue_url)?;
        let scheduler_url = parse_base_url("scheduler_url", &config.scheduler_url)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                RetriggerError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            queue_url = %queue_url,
            scheduler_url = %scheduler_url,
            timeout_ms = config.timeout_ms,
            "Created scheduler HTTP client"
        );

        Ok(Self {
            client,
            queue_url,
            scheduler_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        operation: &str,
        subject: &str,
    ) -> Result<T> {
        debug!(url = %url, operation = operation, "Scheduler read");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RetriggerError::not_found(subject));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation = operation, status = %status, "Scheduler read failed");
            return Err(RetriggerError::Transport(format!(
                "{operation} returned HTTP {status}: {body}"
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn put_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        operation: &str,
        body: &T,
    ) -> Result<()> {
        debug!(url = %url, operation = operation, "Scheduler write");

        let response = self.client.put(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(operation = operation, status = %status, "Scheduler rejected write");
            return Err(RetriggerError::rejected(
                operation,
                format!("HTTP {status}: {text}"),
            ));
        }

        Ok(())
    }
}

fn parse_base_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| RetriggerError::ConfigurationError(format!("Invalid {name}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RetriggerError::ConfigurationError(format!(
            "Invalid {name}: '{value}' cannot be used as a base URL"
        )));
    }
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[async_trait]
impl SchedulerClient for HttpSchedulerClient {
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDefinition> {
        let url = endpoint(&self.queue_url, &["task", task_id]);
        self.get_json(url, operations::FETCH_TASK, task_id).await
    }

    async fn fetch_graph_node(&self, graph_id: &str, task_id: &str) -> Result<GraphNodeInfo> {
        let url = endpoint(
            &self.scheduler_url,
            &["task-graph", graph_id, "inspect", task_id],
        );
        self.get_json(url, operations::FETCH_GRAPH_NODE, task_id)
            .await
    }

    async fn fetch_graph_info(&self, graph_id: &str) -> Result<GraphInfo> {
        let url = endpoint(&self.scheduler_url, &["task-graph", graph_id, "info"]);
        self.get_json(url, operations::FETCH_GRAPH_INFO, graph_id)
            .await
    }

    async fn list_dependent_tasks(
        &self,
        task_id: &str,
        continuation_token: Option<&str>,
        limit: Option<u32>,
    ) -> Result<DependentsPage> {
        let mut url = endpoint(&self.queue_url, &["task", task_id, "dependents"]);
        {
            let mut query = url.query_pairs_mut();
            if let Some(token) = continuation_token {
                query.append_pair("continuationToken", token);
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.get_json(url, operations::LIST_DEPENDENT_TASKS, task_id)
            .await
    }

    async fn create_task_graph(&self, graph_id: &str, graph: &TaskGraphDocument) -> Result<()> {
        let url = endpoint(&self.scheduler_url, &["task-graph", graph_id]);
        self.put_json(url, operations::CREATE_TASK_GRAPH, graph)
            .await
    }

    async fn create_task(&self, task_id: &str, task: &TaskDefinition) -> Result<()> {
        let url = endpoint(&self.queue_url, &["task", task_id]);
        self.put_json(url, operations::CREATE_TASK, task).await
    }
}
