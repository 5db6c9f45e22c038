//! # Retrigger Orchestration
//!
//! Glue that makes the duplicators usable as a retrigger: representation
//! detection, identifier rewriting across the duplicated set, submission to
//! the scheduler and reporting.

pub mod reporter;
pub mod retrigger;
pub mod submission;
pub mod types;

pub use reporter::{LogReporter, RetriggerReporter};
pub use retrigger::RetriggerOrchestrator;
pub use submission::{submission_order, submit_in_dependency_order};
pub use types::{Representation, RetriggerOutcome, RetriggerPlan, RetriggerRequest};
