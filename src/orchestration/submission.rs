//! Ordered submission of duplicated task-group tasks.
//!
//! A task is created only after every dependency that is itself part of the
//! duplicated set has been created. Dependencies outside the set are treated
//! as already satisfied. The order is a depth-first post-order computed with
//! an explicit stack, an owned `submitted` set (each task once) and an
//! `in_progress` set that stops accidental cycles from looping forever.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::DuplicationNode;
use crate::scheduler::SchedulerClient;

/// Indexes into `nodes` in a valid creation order
pub fn submission_order(nodes: &[DuplicationNode]) -> Vec<usize> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.new_id.as_str(), i))
        .collect();

    let in_set_dependencies: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| {
            node.task
                .dependencies()
                .iter()
                .filter_map(|dep| index.get(dep.as_str()).copied())
                .collect()
        })
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    let mut submitted = HashSet::new();
    let mut in_progress = HashSet::new();

    for start in 0..nodes.len() {
        if submitted.contains(&start) {
            continue;
        }

        // (node, dependencies already pushed)
        let mut stack = vec![(start, false)];
        while let Some((current, expanded)) = stack.pop() {
            if submitted.contains(&current) {
                continue;
            }

            if expanded {
                in_progress.remove(&current);
                submitted.insert(current);
                order.push(current);
                continue;
            }

            if !in_progress.insert(current) {
                // reached again through a cycle; its first visit finishes it
                continue;
            }

            stack.push((current, true));
            for &dep in in_set_dependencies[current].iter().rev() {
                if !submitted.contains(&dep) && !in_progress.contains(&dep) {
                    stack.push((dep, false));
                }
            }
        }
    }

    order
}

/// Create every node one at a time, dependencies first.
///
/// Returns the new ids in creation order. On failure, tasks created before
/// the failing one stay live; they are logged and the error is returned
/// unchanged.
pub async fn submit_in_dependency_order(
    scheduler: &dyn SchedulerClient,
    nodes: &[DuplicationNode],
) -> Result<Vec<String>> {
    let mut created = Vec::with_capacity(nodes.len());

    for idx in submission_order(nodes) {
        let node = &nodes[idx];
        debug!(
            new_id = %node.new_id,
            old_id = %node.old_id,
            "Creating duplicated task"
        );

        if let Err(error) = scheduler.create_task(&node.new_id, &node.task).await {
            warn!(
                failed_task_id = %node.new_id,
                created_count = created.len(),
                created = ?created,
                error = %error,
                "Task submission failed; tasks already created remain live"
            );
            return Err(error);
        }
        created.push(node.new_id.clone());
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDefinition;
    use serde_json::json;

    fn node(new_id: &str, deps: &[&str]) -> DuplicationNode {
        DuplicationNode {
            old_id: format!("old-{new_id}"),
            new_id: new_id.to_string(),
            task: TaskDefinition::from_value(json!({ "dependencies": deps })),
            requires: Vec::new(),
            reruns: 0,
        }
    }

    fn ids(nodes: &[DuplicationNode], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| nodes[i].new_id.clone()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        // discovery order puts consumers before their shared dependency
        let nodes = vec![
            node("sign", &["test1", "test2"]),
            node("test1", &["build"]),
            node("test2", &["build", "external"]),
            node("build", &["external"]),
        ];

        let order = ids(&nodes, &submission_order(&nodes));
        assert_eq!(order, vec!["build", "test1", "test2", "sign"]);
    }

    #[test]
    fn test_each_node_once() {
        let nodes = vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a", "b"]),
            node("d", &["a", "b", "c"]),
        ];

        let order = submission_order(&nodes);
        assert_eq!(order.len(), 4);
        assert_eq!(ids(&nodes, &order), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let nodes = vec![node("a", &["b"]), node("b", &["a"])];
        let order = submission_order(&nodes);
        assert_eq!(order.len(), 2);
    }
}
