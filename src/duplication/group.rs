//! # Group Duplicator
//!
//! Duplicates a task from a task group together with everything that
//! (transitively) depends on it.
//!
//! Dependents come from the paginated listing API. For each task the pages
//! are fetched strictly one after another until no continuation token is
//! returned, and tasks are visited depth-first from an explicit worklist, so
//! at most one scheduler call is in flight at any time.
//!
//! Unlike the legacy graph path, a duplicate keeps its `dependencies` list.
//! Whenever a duplicated parent reaches a node (on creation or on a later
//! visit through another path), that parent's old id in the list is replaced
//! with its new id on the spot. Entries that never get replaced point at
//! tasks outside the duplicated set and stay as they are.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::rule::duplicate_task;
use crate::constants::fields;
use crate::error::{Result, RetriggerError};
use crate::identifiers::IdentifierProvider;
use crate::models::{NodeMap, Reservation, TaskSnapshot};
use crate::scheduler::SchedulerClient;

/// A duplicated parent reaching a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub old_id: String,
    pub new_id: String,
}

impl ParentLink {
    pub fn new(old_id: impl Into<String>, new_id: impl Into<String>) -> Self {
        Self {
            old_id: old_id.into(),
            new_id: new_id.into(),
        }
    }
}

#[derive(Debug)]
struct Visit {
    task_id: String,
    parent: Option<ParentLink>,
    include_dependents: bool,
}

pub struct GroupDuplicator {
    scheduler: Arc<dyn SchedulerClient>,
    ids: Arc<dyn IdentifierProvider>,
    reference_time: DateTime<Utc>,
    page_size: Option<u32>,
    prefetched: Option<TaskSnapshot>,
}

impl GroupDuplicator {
    pub fn new(scheduler: Arc<dyn SchedulerClient>, ids: Arc<dyn IdentifierProvider>) -> Self {
        Self {
            scheduler,
            ids,
            reference_time: Utc::now(),
            page_size: None,
            prefetched: None,
        }
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// `limit` sent with each dependents listing request
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Reuse a task definition already read by the caller
    pub fn with_prefetched(mut self, snapshot: TaskSnapshot) -> Self {
        self.prefetched = Some(snapshot);
        self
    }

    /// Duplicate `task_id` (and, with `include_dependents`, every task that
    /// depends on it) into `nodes`.
    #[instrument(skip(self, nodes, parent), fields(task_id = %task_id))]
    pub async fn duplicate_node(
        &self,
        nodes: &mut NodeMap,
        task_id: &str,
        include_dependents: bool,
        parent: Option<ParentLink>,
    ) -> Result<()> {
        let mut worklist = vec![Visit {
            task_id: task_id.to_string(),
            parent,
            include_dependents,
        }];

        while let Some(visit) = worklist.pop() {
            let parent_new_id = visit.parent.as_ref().map(|p| p.new_id.as_str());
            let new_id = match nodes.reserve(&visit.task_id, parent_new_id, || self.ids.generate())
            {
                Reservation::Revisited(new_id) => {
                    debug!(
                        task_id = %visit.task_id,
                        new_id = %new_id,
                        "Task already duplicated, relinking parent"
                    );
                    if let Some(parent) = &visit.parent {
                        link_parent(nodes, &visit.task_id, parent);
                    }
                    continue;
                }
                Reservation::Created(new_id) => new_id,
            };

            let original = self.fetch_definition(&visit.task_id).await?;
            let mut duplicated = duplicate_task(&original.definition, self.reference_time);
            if let Some(dependencies) = original.definition.get(fields::DEPENDENCIES) {
                duplicated.set(fields::DEPENDENCIES, dependencies.clone());
            }
            if let Some(node) = nodes.get_mut(&visit.task_id) {
                node.task = duplicated;
            }
            if let Some(parent) = &visit.parent {
                link_parent(nodes, &visit.task_id, parent);
            }

            if !visit.include_dependents {
                continue;
            }

            let dependents = self.list_all_dependents(&visit.task_id).await?;
            // reversed so the first listed dependent is visited first
            for dependent in dependents.into_iter().rev() {
                worklist.push(Visit {
                    task_id: dependent,
                    parent: Some(ParentLink::new(visit.task_id.clone(), new_id.clone())),
                    include_dependents: true,
                });
            }
        }

        info!(
            task_id = %task_id,
            node_count = nodes.len(),
            "Duplicated task group subtree"
        );

        Ok(())
    }

    async fn fetch_definition(&self, task_id: &str) -> Result<TaskSnapshot> {
        match self.prefetched.as_ref().filter(|s| s.task_id == task_id) {
            Some(snapshot) => Ok(snapshot.clone()),
            None => Ok(TaskSnapshot::new(
                task_id,
                self.scheduler.fetch_task(task_id).await?,
            )),
        }
    }

    /// Follow continuation tokens until the listing is exhausted
    async fn list_all_dependents(&self, task_id: &str) -> Result<Vec<String>> {
        let mut dependents = Vec::new();
        let mut seen = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .scheduler
                .list_dependent_tasks(task_id, token.as_deref(), self.page_size)
                .await?;
            pages += 1;

            for dependent in page.task_ids() {
                if seen.insert(dependent.to_string()) {
                    dependents.push(dependent.to_string());
                }
            }

            match page.continuation_token {
                Some(next) if next.is_empty() => {
                    return Err(RetriggerError::InvalidResponse(format!(
                        "empty continuation token listing dependents of {task_id}"
                    )));
                }
                Some(next) => {
                    if !seen_tokens.insert(next.clone()) {
                        return Err(RetriggerError::InvalidResponse(format!(
                            "repeated continuation token '{next}' listing dependents of {task_id}"
                        )));
                    }
                    token = Some(next);
                }
                None => break,
            }
        }

        debug!(
            task_id = %task_id,
            pages = pages,
            dependents = dependents.len(),
            "Listed dependents"
        );

        Ok(dependents)
    }
}

/// Point the node's dependency on `parent.old_id` at `parent.new_id`
fn link_parent(nodes: &mut NodeMap, task_id: &str, parent: &ParentLink) {
    let Some(node) = nodes.get_mut(task_id) else {
        return;
    };

    if node.task.replace_dependency(&parent.old_id, &parent.new_id) == 0 {
        // listed as a dependent without naming the parent; keep the ordering edge
        warn!(
            task_id = %task_id,
            parent_task_id = %parent.old_id,
            "Dependent does not list its parent in dependencies, adding new parent id"
        );
        let mut dependencies = node.task.dependencies();
        if !dependencies.contains(&parent.new_id) {
            dependencies.push(parent.new_id.clone());
            node.task.set_dependencies(dependencies);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::SequentialIdProvider;
    use crate::models::TaskDefinition;
    use crate::scheduler::InMemoryScheduler;
    use serde_json::json;

    fn task(deps: &[&str]) -> TaskDefinition {
        TaskDefinition::from_value(json!({
            "created": "2015-06-01T00:00:00.000Z",
            "taskGroupId": "group",
            "dependencies": deps,
        }))
    }

    fn duplicator(scheduler: Arc<InMemoryScheduler>) -> GroupDuplicator {
        GroupDuplicator::new(scheduler, Arc::new(SequentialIdProvider::new("new")))
    }

    #[tokio::test]
    async fn test_dependencies_rewritten_inline() {
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler.insert_task("a", task(&["external"]));
        scheduler.insert_task("b", task(&["a", "external"]));

        let mut nodes = NodeMap::new();
        duplicator(scheduler)
            .duplicate_node(&mut nodes, "a", true, None)
            .await
            .unwrap();

        let a = nodes.get("a").unwrap();
        let b = nodes.get("b").unwrap();
        assert_eq!(a.task.dependencies(), vec!["external"]);
        assert_eq!(b.task.dependencies(), vec![a.new_id.as_str(), "external"]);
        assert!(b.task.task_group_id().is_none());
    }

    #[tokio::test]
    async fn test_missing_parent_entry_is_added() {
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler.insert_task("a", task(&[]));
        scheduler.insert_task("b", task(&["a"]));

        let mut nodes = NodeMap::new();
        let dup = duplicator(scheduler);
        dup.duplicate_node(&mut nodes, "a", true, None).await.unwrap();
        // a second, unrelated parent reaching b
        dup.duplicate_node(&mut nodes, "b", true, Some(ParentLink::new("z", "newZ")))
            .await
            .unwrap();

        let b = nodes.get("b").unwrap();
        assert_eq!(b.task.dependencies(), vec!["new1", "newZ"]);
        assert_eq!(b.requires, vec!["new1", "newZ"]);
    }

    #[tokio::test]
    async fn test_without_dependents_no_listing() {
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler.insert_task("a", task(&[]));
        scheduler.insert_task("b", task(&["a"]));

        let mut nodes = NodeMap::new();
        duplicator(scheduler.clone())
            .duplicate_node(&mut nodes, "a", false, None)
            .await
            .unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(scheduler.dependents_requests("a"), 0);
    }

    /// Serves every dependents page with the same fixed token
    struct StuckListing {
        token: &'static str,
    }

    #[async_trait::async_trait]
    impl SchedulerClient for StuckListing {
        async fn fetch_task(&self, _task_id: &str) -> Result<TaskDefinition> {
            Ok(task(&[]))
        }

        async fn fetch_graph_node(
            &self,
            _graph_id: &str,
            task_id: &str,
        ) -> Result<crate::models::GraphNodeInfo> {
            Err(RetriggerError::not_found(task_id))
        }

        async fn fetch_graph_info(&self, graph_id: &str) -> Result<crate::models::GraphInfo> {
            Err(RetriggerError::not_found(graph_id))
        }

        async fn list_dependent_tasks(
            &self,
            _task_id: &str,
            _continuation_token: Option<&str>,
            _limit: Option<u32>,
        ) -> Result<crate::models::DependentsPage> {
            Ok(crate::models::DependentsPage {
                tasks: Vec::new(),
                continuation_token: Some(self.token.to_string()),
            })
        }

        async fn create_task_graph(
            &self,
            _graph_id: &str,
            _graph: &crate::models::TaskGraphDocument,
        ) -> Result<()> {
            Ok(())
        }

        async fn create_task(&self, _task_id: &str, _task: &TaskDefinition) -> Result<()> {
            Ok(())
        }
    }

    async fn duplicate_with_stuck_listing(token: &'static str) -> RetriggerError {
        let duplicator = GroupDuplicator::new(
            Arc::new(StuckListing { token }),
            Arc::new(SequentialIdProvider::new("new")),
        );
        let mut nodes = NodeMap::new();
        duplicator
            .duplicate_node(&mut nodes, "a", true, None)
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_repeated_continuation_token_stops_listing() {
        let err = duplicate_with_stuck_listing("page-2").await;
        assert_eq!(err.kind(), "invalid_response");
        assert!(err.to_string().contains("page-2"));
    }

    #[tokio::test]
    async fn test_empty_continuation_token_stops_listing() {
        let err = duplicate_with_stuck_listing("").await;
        assert_eq!(err.kind(), "invalid_response");
    }
}
