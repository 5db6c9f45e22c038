//! Error types for the retrigger engine.
//!
//! Every failure surfaced by a scheduler read or write ends a retrigger. The
//! only place an error is swallowed is
//! [`RetriggerOrchestrator::handle`](crate::orchestration::RetriggerOrchestrator::handle),
//! which turns it into a failure report.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetriggerError {
    /// A referenced task (or graph node) could not be resolved by the scheduler
    #[error("Task {task_id} not found")]
    NotFound { task_id: String },
    /// The scheduler refused to create a task or task graph
    #[error("Scheduler rejected {operation}: {reason}")]
    SchedulerRejected { operation: String, reason: String },
    #[error("Scheduler transport error: {0}")]
    Transport(String),
    #[error("Invalid scheduler response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Identifier rewrite error: {0}")]
    RewriteError(String),
}

impl RetriggerError {
    pub fn not_found(task_id: impl Into<String>) -> Self {
        RetriggerError::NotFound {
            task_id: task_id.into(),
        }
    }

    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        RetriggerError::SchedulerRejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RetriggerError::NotFound { .. })
    }

    /// Short machine-readable label used in structured log fields and failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            RetriggerError::NotFound { .. } => "not_found",
            RetriggerError::SchedulerRejected { .. } => "scheduler_rejected",
            RetriggerError::Transport(_) => "transport",
            RetriggerError::InvalidResponse(_) => "invalid_response",
            RetriggerError::ConfigurationError(_) => "configuration",
            RetriggerError::RewriteError(_) => "rewrite",
        }
    }
}

impl From<serde_json::Error> for RetriggerError {
    fn from(error: serde_json::Error) -> Self {
        RetriggerError::InvalidResponse(format!("JSON serialization error: {error}"))
    }
}

impl From<reqwest::Error> for RetriggerError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RetriggerError::InvalidResponse(error.to_string())
        } else {
            RetriggerError::Transport(error.to_string())
        }
    }
}

impl From<config::ConfigError> for RetriggerError {
    fn from(error: config::ConfigError) -> Self {
        RetriggerError::ConfigurationError(error.to_string())
    }
}

impl From<aho_corasick::BuildError> for RetriggerError {
    fn from(error: aho_corasick::BuildError) -> Self {
        RetriggerError::RewriteError(format!("Failed to build identifier matcher: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, RetriggerError>;
