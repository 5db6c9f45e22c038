//! HTTP scheduler client against a mock scheduler.

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use taskgraph_retrigger::config::SchedulerConfig;
use taskgraph_retrigger::identifiers::SequentialIdProvider;
use taskgraph_retrigger::models::{GraphTaskEntry, TaskGraphDocument};
use taskgraph_retrigger::orchestration::{Representation, RetriggerOrchestrator, RetriggerRequest};
use taskgraph_retrigger::scheduler::{HttpSchedulerClient, SchedulerClient};
use taskgraph_retrigger::RetriggerError;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpSchedulerClient {
    let config = SchedulerConfig {
        queue_url: format!("{}/queue/v1/", server.uri()),
        scheduler_url: format!("{}/scheduler/v1/", server.uri()),
        timeout_ms: 5_000,
        ..SchedulerConfig::default()
    };
    HttpSchedulerClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue/v1/task/abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(task_definition("abc", &["xyz"]).into_value()),
        )
        .mount(&server)
        .await;

    let task = client(&server).fetch_task("abc").await.unwrap();
    assert_eq!(task.task_group_id(), Some(ORIGINAL_GROUP));
    assert_eq!(task.dependencies(), vec!["xyz"]);
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue/v1/task/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).fetch_task("missing").await.unwrap_err();
    assert_eq!(err, RetriggerError::not_found("missing"));
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scheduler/v1/task-graph/g1/info"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_graph_info("g1").await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_graph_node_inspection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scheduler/v1/task-graph/g1/inspect/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "abc",
            "dependents": ["d1", "d2"],
            "requires": [],
            "reruns": 4,
            "state": "completed"
        })))
        .mount(&server)
        .await;

    let node = client(&server).fetch_graph_node("g1", "abc").await.unwrap();
    assert_eq!(node.dependents, vec!["d1", "d2"]);
    assert_eq!(node.reruns, 4);
}

#[tokio::test]
async fn test_dependents_page_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue/v1/task/abc/dependents"))
        .and(query_param("continuationToken", "page-2"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "abc",
            "tasks": [
                {"status": {"taskId": "d3"}},
                {"status": {"taskId": "d4"}}
            ],
            "continuationToken": "page-3"
        })))
        .mount(&server)
        .await;

    let page = client(&server)
        .list_dependent_tasks("abc", Some("page-2"), Some(2))
        .await
        .unwrap();
    assert_eq!(page.task_ids().collect::<Vec<_>>(), vec!["d3", "d4"]);
    assert_eq!(page.continuation_token.as_deref(), Some("page-3"));
}

#[tokio::test]
async fn test_rejected_task_creation() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/queue/v1/task/new1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("missing scopes"))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_task("new1", &task_definition("new1", &[]))
        .await
        .unwrap_err();

    match err {
        RetriggerError::SchedulerRejected { operation, reason } => {
            assert_eq!(operation, "createTask");
            assert!(reason.contains("missing scopes"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_task_graph_sends_document() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/scheduler/v1/task-graph/graph2"))
        .and(body_partial_json(json!({
            "scopes": ["scheduler:create-task-graph"],
            "tasks": [{"taskId": "new1", "requires": [], "reruns": 2}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let document = TaskGraphDocument {
        scopes: vec!["scheduler:create-task-graph".to_string()],
        tags: Default::default(),
        metadata: json!({"name": "retrigger"}),
        tasks: vec![GraphTaskEntry {
            task_id: "new1".to_string(),
            requires: Vec::new(),
            reruns: 2,
            task: task_definition("new1", &[]),
        }],
    };

    client(&server)
        .create_task_graph("graph2", &document)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_group_retrigger_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue/v1/task/leaf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(task_definition("leaf", &["upstream"]).into_value()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/scheduler/v1/task-graph/{ORIGINAL_GROUP}/inspect/leaf")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/queue/v1/task/leaf/dependents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/queue/v1/task/new1"))
        .and(body_partial_json(json!({
            "taskGroupId": "new2",
            "dependencies": ["upstream"],
            "created": "2015-07-01T10:00:00.000Z",
            "metadata": {"name": "new1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = RetriggerOrchestrator::new(
        Arc::new(client(&server)),
        Arc::new(SequentialIdProvider::new("new")),
    )
    .with_reference_time(reference_time());

    let outcome = orchestrator
        .retrigger(&RetriggerRequest::new("leaf"))
        .await
        .unwrap();

    assert_eq!(outcome.representation, Representation::Group);
    assert_eq!(outcome.new_task_id, "new1");
    assert_eq!(outcome.new_graph_id, "new2");
}
