//! Tool dispatch tests driven through the JSON-RPC handler against a mocked n8n.

mod common;

use std::time::Duration;

use common::{call_tool, handler_for, stored_workflow, summary, FakeN8n};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// -----------------------------------------------------------------------------
// Dispatch
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_unknown_tool_names_the_tool() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    for name in ["frobnicate", "list_workflow", "LIST_WORKFLOWS", ""] {
        let envelope = call_tool(&handler, name, json!({})).await;
        assert_eq!(envelope["isError"], true);
        assert!(summary(&envelope).contains(&format!("Unknown tool: {}", name)));
    }

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_missing_required_arguments_make_no_requests() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let tools = handler.registry().list_tools();
    let mut checked = 0;
    for tool in tools {
        let required: Vec<String> = tool.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        let Some(first) = required.first() else { continue };

        let envelope = call_tool(&handler, &tool.name, json!({})).await;
        assert_eq!(envelope["isError"], true, "tool {} accepted empty arguments", tool.name);
        assert!(
            summary(&envelope).contains(first.as_str()),
            "tool {} error does not name '{}': {}",
            tool.name,
            first,
            summary(&envelope)
        );
        checked += 1;
    }

    assert!(checked >= 12);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty(), "validation failures must not reach n8n");
}

#[tokio::test]
async fn test_structural_type_mismatches_are_rejected() {
    let server = MockServer::start().await;
    let handler = handler_for(&server);

    let envelope =
        call_tool(&handler, "update_workflow", json!({ "name": "Test", "nodes": "not-a-list" }))
            .await;
    assert_eq!(envelope["isError"], true);
    assert!(summary(&envelope).contains("nodes"));

    let envelope =
        call_tool(&handler, "create_workflow", json!({ "name": "X", "connections": [] })).await;
    assert_eq!(envelope["isError"], true);
    assert!(summary(&envelope).contains("connections"));

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_unknown_argument_keys_are_rejected() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new();
    fake.insert(stored_workflow("wf-1", "Test", false));
    fake.clone().mount(&server).await;
    let handler = handler_for(&server);

    let envelope = call_tool(
        &handler,
        "update_workflow",
        json!({ "name": "Test", "newname": "Renamed", "activ": true }),
    )
    .await;
    assert_eq!(envelope["isError"], true);
    assert!(summary(&envelope).contains("newname"), "{}", summary(&envelope));
    assert!(summary(&envelope).contains("activ"), "{}", summary(&envelope));

    let envelope = call_tool(&handler, "list_tags", json!({ "limit": 5 })).await;
    assert_eq!(envelope["isError"], true);
    assert!(summary(&envelope).contains("limit"));

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty(), "rejected arguments must not reach n8n");
    assert_eq!(fake.get("wf-1").expect("stored")["name"], "Test");
}

#[tokio::test]
async fn test_execute_workflow_with_empty_body_has_object_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-1/execute"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let envelope =
        call_tool(&handler_for(&server), "execute_workflow", json!({ "id": "wf-1" })).await;

    assert_eq!(envelope["isError"], false);
    assert!(envelope["structuredContent"].is_object());
    assert_eq!(envelope["structuredContent"]["id"], "wf-1");
}

#[tokio::test]
async fn test_upstream_failure_becomes_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/42"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "unauthorized" })))
        .mount(&server)
        .await;

    let envelope = call_tool(&handler_for(&server), "get_workflow", json!({ "id": "42" })).await;
    assert_eq!(envelope["isError"], true);
    assert_eq!(summary(&envelope), "n8n API error (401): unauthorized");
    assert_eq!(envelope["content"].as_array().unwrap().len(), 1);
}

// -----------------------------------------------------------------------------
// Update workflow
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_update_reports_active_transition() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new();
    fake.insert(stored_workflow("wf-1", "Test", false));
    fake.clone().mount(&server).await;

    let envelope =
        call_tool(&handler_for(&server), "update_workflow", json!({ "name": "Test", "active": true }))
            .await;

    assert_eq!(envelope["isError"], false);
    assert!(summary(&envelope).contains("active: false → true"));
    assert_eq!(envelope["structuredContent"]["active"], true);
    assert_eq!(fake.get("wf-1").expect("still stored")["active"], true);
}

#[tokio::test]
async fn test_update_without_fields_reports_no_changes() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new();
    fake.insert(stored_workflow("wf-1", "Test", false));
    fake.mount(&server).await;

    let envelope = call_tool(&handler_for(&server), "update_workflow", json!({ "name": "Test" })).await;

    assert_eq!(envelope["isError"], false);
    assert_eq!(summary(&envelope), "No changes were made");
}

#[tokio::test]
async fn test_update_renames_and_merges_settings() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new();
    fake.insert(stored_workflow("wf-1", "Test", false));
    fake.clone().mount(&server).await;

    let envelope = call_tool(
        &handler_for(&server),
        "update_workflow",
        json!({
            "name": "Test",
            "newName": "Nightly sync",
            "settings": { "timezone": "Europe/Berlin" }
        }),
    )
    .await;

    assert_eq!(envelope["isError"], false, "{}", summary(&envelope));
    assert!(summary(&envelope).contains("name: \"Test\" → \"Nightly sync\""));

    let stored = fake.get("wf-1").expect("stored");
    assert_eq!(stored["name"], "Nightly sync");
    assert_eq!(stored["settings"]["timezone"], "Europe/Berlin");
    assert_eq!(stored["settings"]["saveExecutionProgress"], true);
}

#[tokio::test]
async fn test_update_unknown_workflow_name() {
    let server = MockServer::start().await;
    FakeN8n::new().mount(&server).await;

    let envelope = call_tool(&handler_for(&server), "update_workflow", json!({ "name": "Ghost" })).await;
    assert_eq!(envelope["isError"], true);
    assert_eq!(summary(&envelope), "Workflow not found: Ghost");
}

/// Updates are read-modify-write without any conditional write. Two concurrent updates
/// of disjoint fields can both succeed while one of the changes is lost; this test
/// records that behavior instead of asserting isolation.
#[tokio::test]
async fn test_concurrent_updates_may_lose_a_change() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new().with_read_delay(Duration::from_millis(200));
    fake.insert(stored_workflow("wf-1", "Test", false));
    fake.clone().mount(&server).await;

    let handler = handler_for(&server);
    let (first, second) = tokio::join!(
        call_tool(&handler, "update_workflow", json!({ "name": "Test", "active": true })),
        call_tool(
            &handler,
            "update_workflow",
            json!({ "name": "Test", "settings": { "timezone": "Asia/Tokyo" } })
        ),
    );
    assert_eq!(first["isError"], false);
    assert_eq!(second["isError"], false);

    let stored = fake.get("wf-1").expect("stored");
    let activated = stored["active"] == true;
    let retimed = stored["settings"]["timezone"] == "Asia/Tokyo";
    assert!(activated || retimed, "at least the last write must persist");
    if !(activated && retimed) {
        eprintln!("lost update observed: active={} timezone_changed={}", activated, retimed);
    }
}

// -----------------------------------------------------------------------------
// Create / get / delete
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_create_applies_default_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows"))
        .and(body_partial_json(json!({
            "settings": { "saveExecutionProgress": true, "timezone": "UTC" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_workflow("wf-7", "New", false)))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = call_tool(&handler_for(&server), "create_workflow", json!({ "name": "New" })).await;

    assert_eq!(envelope["isError"], false);
    assert_eq!(envelope["structuredContent"]["settings"]["saveExecutionProgress"], true);
    assert_eq!(envelope["structuredContent"]["settings"]["timezone"], "UTC");
}

#[tokio::test]
async fn test_create_get_delete_round_trip() {
    let server = MockServer::start().await;
    FakeN8n::new().mount(&server).await;
    let handler = handler_for(&server);

    let created = call_tool(
        &handler,
        "create_workflow",
        json!({ "name": "Round trip", "nodes": [{ "name": "Start", "type": "n8n-nodes-base.start" }] }),
    )
    .await;
    assert_eq!(created["isError"], false);
    let id = created["structuredContent"]["id"].as_str().expect("id").to_string();
    assert_eq!(created["structuredContent"]["settings"]["timezone"], "UTC");

    let fetched = call_tool(&handler, "get_workflow", json!({ "id": id })).await;
    assert_eq!(fetched["isError"], false);
    assert_eq!(fetched["structuredContent"]["name"], "Round trip");
    assert_eq!(fetched["structuredContent"]["nodes"].as_array().unwrap().len(), 1);

    let deleted = call_tool(&handler, "delete_workflow", json!({ "id": id })).await;
    assert_eq!(deleted["isError"], false);
    assert_eq!(summary(&deleted), format!("Workflow {} deleted", id));

    let listed = call_tool(&handler, "list_workflows", json!({})).await;
    let ids: Vec<&Value> =
        listed["structuredContent"]["workflows"].as_array().unwrap().iter().map(|w| &w["id"]).collect();
    assert!(!ids.contains(&&json!(id)));
}

#[tokio::test]
async fn test_activate_and_deactivate_are_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-1/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_workflow("wf-1", "Test", true)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-1/deactivate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_workflow("wf-1", "Test", false)))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    for _ in 0..2 {
        let envelope = call_tool(&handler, "activate_workflow", json!({ "id": "wf-1" })).await;
        assert_eq!(envelope["structuredContent"]["active"], true);
    }
    let envelope = call_tool(&handler, "deactivate_workflow", json!({ "id": "wf-1" })).await;
    assert_eq!(summary(&envelope), "Workflow wf-1 is now inactive");
}

#[tokio::test]
async fn test_success_envelope_carries_summary_and_json() {
    let server = MockServer::start().await;
    let fake = FakeN8n::new();
    fake.insert(stored_workflow("wf-1", "One", true));
    fake.insert(stored_workflow("wf-2", "Two", false));
    fake.mount(&server).await;

    let envelope = call_tool(&handler_for(&server), "list_workflows", json!({})).await;

    assert_eq!(summary(&envelope), "Found 2 workflow(s) (1 active)");
    let pretty = envelope["content"][1]["text"].as_str().expect("json block");
    let parsed: Value = serde_json::from_str(pretty).expect("pretty JSON parses");
    assert_eq!(parsed, envelope["structuredContent"]);
    assert_eq!(parsed["count"], 2);
}
