#![allow(clippy::doc_markdown)] // Allow technical terms like TaskGraph, RFC3339 in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Task Graph Retrigger
//!
//! Retrigger engine for a CI task scheduler: given a task that is part of an
//! already accepted dependency graph, build a new, independently schedulable
//! copy of that task and of everything that (transitively) depends on it, and
//! submit it. The original graph is never modified.
//!
//! ## Overview
//!
//! The scheduler has two graph representations and each gets its own
//! duplicator:
//!
//! - **Legacy task graphs**: per-node metadata lists dependents; the copy is
//!   submitted as one atomic graph document.
//! - **Task groups**: dependents come from a paginated listing; the copy is
//!   submitted task by task in dependency order.
//!
//! In both cases every duplicate gets a fresh id, all absolute dates are
//! rebased so relative timing is preserved, and every occurrence of an old
//! id anywhere in the duplicated definitions (including opaque payloads) is
//! rewritten to its new id. Dependencies on tasks outside the duplicated set
//! are left as they are.
//!
//! ## Module Organization
//!
//! - [`duplication`] - Duplication rule, identifier rewriter, graph and group duplicators
//! - [`orchestration`] - Retrigger orchestrator, submission ordering, reporting
//! - [`scheduler`] - Scheduler contract with HTTP and in-memory implementations
//! - [`models`] - Task definitions, scheduler payloads and duplication bookkeeping
//! - [`identifiers`] - Identifier providers
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskgraph_retrigger::config::RetriggerConfig;
//! use taskgraph_retrigger::orchestration::{RetriggerOrchestrator, RetriggerRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! taskgraph_retrigger::logging::init_structured_logging();
//!
//! let config = RetriggerConfig::from_env()?;
//! let orchestrator = RetriggerOrchestrator::from_config(&config)?;
//!
//! let request = RetriggerRequest::new("fN1GlS4ZQB-cY0V1wZdRmA")
//!     .with_scopes(vec!["queue:create-task:aws-provisioner/b2g".to_string()]);
//! let outcome = orchestrator.retrigger(&request).await?;
//! println!("retriggered as {} in {}", outcome.new_task_id, outcome.new_graph_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod duplication;
pub mod error;
pub mod identifiers;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod scheduler;

pub use config::{RetriggerConfig, SchedulerConfig, TraversalConfig};
pub use duplication::{
    duplicate_task, rewrite_identifiers, GraphDuplicator, GroupDuplicator, IdentifierRewriter,
};
pub use error::{Result, RetriggerError};
pub use identifiers::{IdentifierProvider, SequentialIdProvider, SlugIdProvider};
pub use models::{DuplicationNode, NodeMap, TaskDefinition, TaskSnapshot};
pub use orchestration::{
    Representation, RetriggerOrchestrator, RetriggerOutcome, RetriggerPlan, RetriggerRequest,
};
pub use scheduler::{HttpSchedulerClient, InMemoryScheduler, SchedulerClient};
