//! # Retrigger Orchestrator
//!
//! Re-runs a task and everything depending on it without touching the
//! original graph or group.
//!
//! ## Flow
//!
//! 1. Work out whether the task lives in a legacy task graph or a task group
//! 2. Duplicate the task and all of its dependents with the matching duplicator
//! 3. Rewrite every old id to its new id throughout the duplicated definitions
//! 4. Submit: a legacy graph as one atomic graph document, a group task by
//!    task in dependency order
//! 5. Report the new graph/group id (or the failure) to the reporter
//!
//! Steps 1–3 only read from the scheduler and produce a [`RetriggerPlan`];
//! a failure there leaves nothing behind. Step 4 on a group can fail after
//! some tasks were already created; those are not rolled back.
//!
//! ## Representation detection
//!
//! A request may name its representation explicitly. Otherwise the target
//! task's `taskGroupId` is looked up as a legacy graph: a graph node for the
//! task means "graph", `NotFound` means "group". Any other lookup error fails
//! the retrigger instead of guessing.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::reporter::{LogReporter, RetriggerReporter};
use super::submission::submit_in_dependency_order;
use super::types::{Representation, RetriggerOutcome, RetriggerPlan, RetriggerRequest};
use crate::config::{RetriggerConfig, TraversalConfig};
use crate::duplication::{GraphDuplicator, GroupDuplicator, IdentifierRewriter};
use crate::error::{Result, RetriggerError};
use crate::identifiers::{IdentifierProvider, SlugIdProvider};
use crate::logging::{log_error, log_retrigger_operation};
use crate::models::{GraphTaskEntry, NodeMap, TaskGraphDocument, TaskSnapshot};
use crate::scheduler::{HttpSchedulerClient, SchedulerClient};

pub struct RetriggerOrchestrator {
    scheduler: Arc<dyn SchedulerClient>,
    ids: Arc<dyn IdentifierProvider>,
    reporter: Arc<dyn RetriggerReporter>,
    traversal: TraversalConfig,
    dry_run: bool,
    reference_time: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for RetriggerOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetriggerOrchestrator")
            .field("traversal", &self.traversal)
            .field("dry_run", &self.dry_run)
            .field("reference_time", &self.reference_time)
            .finish()
    }
}

impl RetriggerOrchestrator {
    pub fn new(scheduler: Arc<dyn SchedulerClient>, ids: Arc<dyn IdentifierProvider>) -> Self {
        Self {
            scheduler,
            ids,
            reporter: Arc::new(LogReporter),
            traversal: TraversalConfig::default(),
            dry_run: false,
            reference_time: None,
        }
    }

    /// HTTP scheduler client and slug ids, configured from `config`
    pub fn from_config(config: &RetriggerConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = HttpSchedulerClient::new(&config.scheduler)?;

        Ok(Self::new(Arc::new(scheduler), Arc::new(SlugIdProvider))
            .with_traversal_config(config.traversal.clone())
            .with_dry_run(config.dry_run))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn RetriggerReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_traversal_config(mut self, traversal: TraversalConfig) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fixed instant to rebase duplicates to; defaults to the time of each plan
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    /// Retrigger and report the result. Errors end here: they are turned into
    /// a failure report and `None` is returned.
    pub async fn handle(&self, request: &RetriggerRequest) -> Option<RetriggerOutcome> {
        match self.retrigger(request).await {
            Ok(outcome) => {
                self.reporter.report_success(request, &outcome).await;
                Some(outcome)
            }
            Err(error) => {
                log_error(
                    "retrigger_orchestrator",
                    "retrigger",
                    &error.to_string(),
                    Some(&request.task_id),
                );
                self.reporter.report_failure(request, &error).await;
                None
            }
        }
    }

    /// Plan and, unless this is a dry run, submit
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    pub async fn retrigger(&self, request: &RetriggerRequest) -> Result<RetriggerOutcome> {
        let plan = self.plan(request).await?;

        if self.dry_run {
            info!(
                task_id = %request.task_id,
                node_count = plan.nodes.len(),
                "Dry run: duplicated tasks not submitted"
            );
            return Ok(outcome(&plan, false));
        }

        self.submit(&plan).await
    }

    /// Duplicate and rewrite without writing anything to the scheduler
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    pub async fn plan(&self, request: &RetriggerRequest) -> Result<RetriggerPlan> {
        let reference_time = self.reference_time.unwrap_or_else(Utc::now);
        let (representation, root) = self.detect_representation(request).await?;

        log_retrigger_operation(
            "plan",
            &request.task_id,
            Some(representation.label()),
            "started",
            None,
            None,
        );

        let mut nodes = NodeMap::new();
        let graph_info = match &representation {
            Representation::Graph { graph_id } => {
                let mut duplicator =
                    GraphDuplicator::new(self.scheduler.clone(), self.ids.clone())
                        .with_reference_time(reference_time)
                        .with_fetch_concurrency(self.traversal.graph_fetch_concurrency);
                if let Some(root) = root {
                    duplicator = duplicator.with_prefetched(root);
                }

                let ((), info) = tokio::try_join!(
                    duplicator.duplicate_node(&mut nodes, graph_id, &request.task_id, true, None),
                    self.scheduler.fetch_graph_info(graph_id)
                )?;
                Some(info)
            }
            Representation::Group => {
                let mut duplicator =
                    GroupDuplicator::new(self.scheduler.clone(), self.ids.clone())
                        .with_reference_time(reference_time)
                        .with_page_size(self.traversal.dependents_page_size);
                if let Some(root) = root {
                    duplicator = duplicator.with_prefetched(root);
                }

                duplicator
                    .duplicate_node(&mut nodes, &request.task_id, true, None)
                    .await?;
                None
            }
        };

        let new_graph_id = self.ids.generate();
        let mapping = nodes.id_mapping();
        let rewriter = IdentifierRewriter::new(&mapping)?;

        let mut duplicated = nodes.into_nodes();
        for node in &mut duplicated {
            node.task = rewriter.rewrite_task(&node.task);
            if representation == Representation::Group {
                node.task.set_task_group_id(&new_graph_id);
            }
        }

        log_retrigger_operation(
            "plan",
            &request.task_id,
            Some(representation.label()),
            "completed",
            Some(duplicated.len()),
            None,
        );

        Ok(RetriggerPlan {
            task_id: request.task_id.clone(),
            representation,
            new_graph_id,
            scopes: request.scopes.clone(),
            nodes: duplicated,
            graph_info,
        })
    }

    /// Write a plan to the scheduler
    #[instrument(skip(self, plan), fields(task_id = %plan.task_id, new_graph_id = %plan.new_graph_id))]
    pub async fn submit(&self, plan: &RetriggerPlan) -> Result<RetriggerOutcome> {
        match &plan.representation {
            Representation::Graph { .. } => {
                let info = plan.graph_info.clone().unwrap_or_default();
                let document = TaskGraphDocument {
                    scopes: plan.scopes.clone(),
                    tags: info.tags,
                    metadata: info.metadata,
                    tasks: plan
                        .nodes
                        .iter()
                        .map(|node| GraphTaskEntry {
                            task_id: node.new_id.clone(),
                            requires: node.requires.clone(),
                            reruns: node.reruns,
                            task: node.task.clone(),
                        })
                        .collect(),
                };

                self.scheduler
                    .create_task_graph(&plan.new_graph_id, &document)
                    .await?;
            }
            Representation::Group => {
                submit_in_dependency_order(self.scheduler.as_ref(), &plan.nodes).await?;
            }
        }

        log_retrigger_operation(
            "submit",
            &plan.task_id,
            Some(plan.representation.label()),
            "completed",
            Some(plan.nodes.len()),
            Some(&plan.new_graph_id),
        );

        Ok(outcome(plan, true))
    }

    /// Resolve the representation, returning the root snapshot if it had to
    /// be read along the way
    async fn detect_representation(
        &self,
        request: &RetriggerRequest,
    ) -> Result<(Representation, Option<TaskSnapshot>)> {
        if let Some(representation) = &request.representation {
            debug!(
                task_id = %request.task_id,
                representation = representation.label(),
                "Representation given by request"
            );
            return Ok((representation.clone(), None));
        }

        let definition = self.scheduler.fetch_task(&request.task_id).await?;
        let snapshot = TaskSnapshot::new(request.task_id.clone(), definition);

        let Some(graph_id) = snapshot.definition.task_group_id().map(str::to_string) else {
            debug!(task_id = %request.task_id, "Task has no group id, treating as task group");
            return Ok((Representation::Group, Some(snapshot)));
        };

        match self
            .scheduler
            .fetch_graph_node(&graph_id, &request.task_id)
            .await
        {
            Ok(graph_node) => {
                debug!(task_id = %request.task_id, graph_id = %graph_id, "Task belongs to a legacy task graph");
                Ok((
                    Representation::Graph { graph_id },
                    Some(snapshot.with_graph_node(graph_node)),
                ))
            }
            Err(RetriggerError::NotFound { .. }) => {
                debug!(task_id = %request.task_id, group_id = %graph_id, "No graph node, treating as task group");
                Ok((Representation::Group, Some(snapshot)))
            }
            Err(error) => Err(error),
        }
    }
}

fn outcome(plan: &RetriggerPlan, submitted: bool) -> RetriggerOutcome {
    RetriggerOutcome {
        task_id: plan.task_id.clone(),
        representation: plan.representation.clone(),
        new_graph_id: plan.new_graph_id.clone(),
        new_task_id: plan.new_task_id().unwrap_or_default().to_string(),
        task_mapping: plan.task_mapping(),
        submitted,
    }
}
