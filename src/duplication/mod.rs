//! # Task Duplication
//!
//! The pieces that turn an existing task and its dependents into a fresh,
//! independently schedulable set of tasks:
//!
//! - [`rule`]: duplicate one definition, rebasing its dates
//! - [`rewriter`]: replace old ids with new ids anywhere in task data
//! - [`graph`]: walk a legacy task graph
//! - [`group`]: walk a task group via the paginated dependents listing

pub mod graph;
pub mod group;
pub mod rewriter;
pub mod rule;

pub use graph::GraphDuplicator;
pub use group::{GroupDuplicator, ParentLink};
pub use rewriter::{rewrite_identifiers, IdentifierRewriter};
pub use rule::{duplicate_task, duplicate_task_now};
