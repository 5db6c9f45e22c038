//! Reporting retrigger results back to whoever asked for them.

use async_trait::async_trait;
use tracing::{error, info};

use super::types::{RetriggerOutcome, RetriggerRequest};
use crate::error::RetriggerError;

#[async_trait]
pub trait RetriggerReporter: Send + Sync {
    async fn report_success(&self, request: &RetriggerRequest, outcome: &RetriggerOutcome);

    /// Best-effort failure notice; must not fail itself
    async fn report_failure(&self, request: &RetriggerRequest, error: &RetriggerError);
}

/// Reports through structured logs only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

#[async_trait]
impl RetriggerReporter for LogReporter {
    async fn report_success(&self, request: &RetriggerRequest, outcome: &RetriggerOutcome) {
        info!(
            task_id = %request.task_id,
            requested_by = request.requested_by.as_deref(),
            representation = outcome.representation.label(),
            new_graph_id = %outcome.new_graph_id,
            new_task_id = %outcome.new_task_id,
            task_count = outcome.task_mapping.len(),
            submitted = outcome.submitted,
            "Retrigger succeeded"
        );
    }

    async fn report_failure(&self, request: &RetriggerRequest, error: &RetriggerError) {
        error!(
            task_id = %request.task_id,
            requested_by = request.requested_by.as_deref(),
            error_kind = error.kind(),
            error = %error,
            "Retrigger failed"
        );
    }
}
