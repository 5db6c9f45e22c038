//! # Graph Duplicator
//!
//! Duplicates a task from a legacy task graph together with everything that
//! (transitively) depends on it.
//!
//! Traversal goes outward, from the target toward its dependents, one level
//! at a time. All reads of a level (task definition plus graph node for each
//! newly discovered task) are issued concurrently, bounded by the fetch
//! concurrency. The results are then merged into the caller's [`NodeMap`] on
//! the current task, so visiting a task and inserting its node is a single
//! step and a task reachable through several parents is duplicated once, with
//! every parent recorded in its `requires`.
//!
//! Dependency lists and group membership are dropped from duplicates; in this
//! representation the new graph's `requires` edges replace them.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::rule::duplicate_task;
use crate::constants::defaults;
use crate::error::Result;
use crate::identifiers::IdentifierProvider;
use crate::models::{NodeMap, TaskSnapshot};
use crate::scheduler::SchedulerClient;

pub struct GraphDuplicator {
    scheduler: Arc<dyn SchedulerClient>,
    ids: Arc<dyn IdentifierProvider>,
    reference_time: DateTime<Utc>,
    fetch_concurrency: usize,
    prefetched: Option<TaskSnapshot>,
}

impl GraphDuplicator {
    pub fn new(scheduler: Arc<dyn SchedulerClient>, ids: Arc<dyn IdentifierProvider>) -> Self {
        Self {
            scheduler,
            ids,
            reference_time: Utc::now(),
            fetch_concurrency: defaults::GRAPH_FETCH_CONCURRENCY,
            prefetched: None,
        }
    }

    /// Instant every duplicate is rebased to
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    /// Reuse a snapshot already read by the caller instead of fetching it
    /// again. Only used when it carries graph node metadata.
    pub fn with_prefetched(mut self, snapshot: TaskSnapshot) -> Self {
        self.prefetched = Some(snapshot).filter(|s| s.graph_node.is_some());
        self
    }

    /// Duplicate `task_id` (and, with `include_dependents`, every task that
    /// depends on it) into `nodes`.
    ///
    /// If `task_id` is already in `nodes`, only `parent_new_id` is recorded on
    /// the existing node. Dependents are always followed with
    /// `include_dependents = true`.
    #[instrument(skip(self, nodes), fields(graph_id = %graph_id, task_id = %task_id))]
    pub async fn duplicate_node(
        &self,
        nodes: &mut NodeMap,
        graph_id: &str,
        task_id: &str,
        include_dependents: bool,
        parent_new_id: Option<&str>,
    ) -> Result<()> {
        let reservation = nodes.reserve(task_id, parent_new_id, || self.ids.generate());
        if !reservation.is_created() {
            debug!(
                task_id = %task_id,
                new_id = %reservation.new_id(),
                "Task already duplicated, recorded parent only"
            );
            return Ok(());
        }

        let mut frontier = vec![task_id.to_string()];
        let mut depth = 0usize;

        while !frontier.is_empty() {
            debug!(depth = depth, width = frontier.len(), "Fetching graph level");

            let snapshots: Vec<TaskSnapshot> = stream::iter(
                frontier
                    .iter()
                    .map(|old_id| self.fetch_snapshot(graph_id, old_id)),
            )
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await?;

            let mut next = Vec::new();
            for snapshot in snapshots {
                let Some(node) = nodes.get_mut(&snapshot.task_id) else {
                    continue;
                };
                node.task = duplicate_task(&snapshot.definition, self.reference_time);
                node.reruns = snapshot.reruns();
                let new_id = node.new_id.clone();

                if !include_dependents {
                    continue;
                }

                for dependent in snapshot.dependents() {
                    let reservation =
                        nodes.reserve(dependent, Some(&new_id), || self.ids.generate());
                    if reservation.is_created() {
                        next.push(dependent.clone());
                    }
                }
            }

            frontier = next;
            depth += 1;
        }

        info!(
            graph_id = %graph_id,
            task_id = %task_id,
            node_count = nodes.len(),
            depth = depth,
            "Duplicated task graph subtree"
        );

        Ok(())
    }

    async fn fetch_snapshot(&self, graph_id: &str, task_id: &str) -> Result<TaskSnapshot> {
        if let Some(snapshot) = self
            .prefetched
            .as_ref()
            .filter(|s| s.task_id == task_id)
        {
            return Ok(snapshot.clone());
        }

        let (definition, graph_node) = tokio::try_join!(
            self.scheduler.fetch_task(task_id),
            self.scheduler.fetch_graph_node(graph_id, task_id)
        )?;

        Ok(TaskSnapshot::new(task_id, definition).with_graph_node(graph_node))
    }
}
