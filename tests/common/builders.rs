//! Scheduler fixtures for retrigger tests.
//!
//! Graphs are described as `(task, dependencies)` pairs, the way a task group
//! stores them. For legacy graphs the per-node dependents lists are derived
//! from the same description.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use taskgraph_retrigger::models::{GraphInfo, GraphNodeInfo, TaskDefinition};
use taskgraph_retrigger::scheduler::InMemoryScheduler;

pub const ORIGINAL_GROUP: &str = "originalGroup";
pub const CREATED: &str = "2015-06-01T10:00:00.000Z";
pub const DEADLINE: &str = "2015-06-02T10:00:00.000Z";

pub fn reference_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2015-07-01T10:00:00.000Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Task definition in the scheduler's shape
pub fn task_definition(task_id: &str, dependencies: &[&str]) -> TaskDefinition {
    TaskDefinition::from_value(json!({
        "provisionerId": "aws-provisioner",
        "workerType": "b2gtest",
        "schedulerId": "task-graph-scheduler",
        "taskGroupId": ORIGINAL_GROUP,
        "dependencies": dependencies,
        "requires": "all-completed",
        "created": CREATED,
        "deadline": DEADLINE,
        "payload": {
            "command": ["run", task_id],
        },
        "metadata": {
            "name": task_id,
            "description": format!("{task_id} task"),
            "owner": "ci@example.com",
            "source": "https://hg.example.com/try/"
        }
    }))
}

pub struct GraphFixture {
    tasks: Vec<(String, Vec<String>)>,
    page_size: usize,
    payloads: Vec<(String, Value)>,
    reject_tasks_after: Option<usize>,
    reject_graphs: bool,
}

impl GraphFixture {
    pub fn new(tasks: &[(&str, &[&str])]) -> Self {
        Self {
            tasks: tasks
                .iter()
                .map(|(id, deps)| (id.to_string(), deps.iter().map(|d| d.to_string()).collect()))
                .collect(),
            page_size: 1000,
            payloads: Vec::new(),
            reject_tasks_after: None,
            reject_graphs: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Replace a task's payload
    pub fn with_payload(mut self, task_id: &str, payload: Value) -> Self {
        self.payloads.push((task_id.to_string(), payload));
        self
    }

    /// Scheduler accepts `count` task creations, then rejects the rest
    pub fn rejecting_tasks_after(mut self, count: usize) -> Self {
        self.reject_tasks_after = Some(count);
        self
    }

    pub fn rejecting_graphs(mut self) -> Self {
        self.reject_graphs = true;
        self
    }

    fn scheduler(&self) -> InMemoryScheduler {
        let mut scheduler = InMemoryScheduler::new().with_page_size(self.page_size);
        if let Some(count) = self.reject_tasks_after {
            scheduler = scheduler.reject_tasks_after(count);
        }
        if self.reject_graphs {
            scheduler = scheduler.reject_graphs();
        }
        scheduler
    }

    fn definition(&self, task_id: &str, deps: &[String]) -> TaskDefinition {
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        let mut task = task_definition(task_id, &deps);
        if let Some((_, payload)) = self.payloads.iter().find(|(id, _)| id == task_id) {
            task.set("payload", payload.clone());
        }
        task
    }

    fn dependents_of(&self, task_id: &str) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d == task_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Task group: tasks only, dependents derived from `dependencies`
    pub fn group(&self) -> Arc<InMemoryScheduler> {
        let scheduler = self.scheduler();
        for (id, deps) in &self.tasks {
            scheduler.insert_task(id.as_str(), self.definition(id, deps));
        }
        Arc::new(scheduler)
    }

    /// Legacy task graph `ORIGINAL_GROUP` with per-node dependents
    pub fn legacy_graph(&self) -> Arc<InMemoryScheduler> {
        let scheduler = self.scheduler();
        scheduler.insert_graph(
            ORIGINAL_GROUP,
            GraphInfo {
                task_graph_id: ORIGINAL_GROUP.to_string(),
                tags: json!({"revision": "abcdef123456", "project": "try"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                metadata: json!({"name": "try push", "owner": "dev@example.com"}),
            },
        );
        for (id, deps) in &self.tasks {
            scheduler.insert_task(id.as_str(), self.definition(id, deps));
            scheduler.insert_graph_node(
                ORIGINAL_GROUP,
                GraphNodeInfo {
                    task_id: id.clone(),
                    dependents: self.dependents_of(id),
                    requires: deps.clone(),
                    reruns: 3,
                },
            );
        }
        Arc::new(scheduler)
    }
}

/// Linear chain: task-b depends on task-a, task-c on task-b, task-d on task-c
pub fn chain() -> GraphFixture {
    GraphFixture::new(&[
        ("task-a", &[]),
        ("task-b", &["task-a"]),
        ("task-c", &["task-b"]),
        ("task-d", &["task-c"]),
    ])
}

/// build → {test1, test2} → sign, with inputs from outside the set
pub fn diamond() -> GraphFixture {
    GraphFixture::new(&[
        ("build", &["other1"]),
        ("test1", &["build", "other2"]),
        ("test2", &["build", "other3"]),
        ("sign", &["test1", "test2"]),
    ])
}
