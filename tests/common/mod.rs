//! Shared helpers for integration tests: an in-memory n8n fake served by wiremock.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use n8n_mcp::config::N8nConfig;
use n8n_mcp::mcp::protocol::{JsonRpcId, JsonRpcRequest};
use n8n_mcp::mcp::{McpHandler, ToolRegistry};
use n8n_mcp::n8n::N8nClient;
use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Stateful stand-in for the n8n workflow endpoints
#[derive(Clone, Default)]
pub struct FakeN8n {
    workflows: Arc<Mutex<BTreeMap<String, Value>>>,
    next_id: Arc<AtomicU64>,
    read_delay: Option<Duration>,
}

impl FakeN8n {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay single-workflow reads so concurrent updates overlap
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn insert(&self, workflow: Value) {
        let id = workflow["id"].as_str().unwrap_or_default().to_string();
        self.workflows.lock().unwrap().insert(id, workflow);
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.workflows.lock().unwrap().get(id).cloned()
    }

    pub async fn mount(self, server: &MockServer) {
        Mock::given(path_regex(r"^/api/v1/workflows(/[^/]+)?$")).respond_with(self).mount(server).await;
    }
}

impl Respond for FakeN8n {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> =
            request.url.path_segments().map(|s| s.collect()).unwrap_or_default();
        let id = segments.get(3).map(|s| s.to_string());
        let mut store = self.workflows.lock().unwrap();

        match (request.method.as_str(), id) {
            ("GET", None) => {
                let data: Vec<Value> = store.values().cloned().collect();
                ResponseTemplate::new(200).set_body_json(json!({ "data": data, "nextCursor": null }))
            }
            ("POST", None) => {
                let mut workflow: Value = serde_json::from_slice(&request.body).unwrap_or(json!({}));
                let id = format!("wf-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                workflow["id"] = json!(id);
                store.insert(id, workflow.clone());
                ResponseTemplate::new(200).set_body_json(workflow)
            }
            ("GET", Some(id)) => match store.get(&id) {
                Some(workflow) => {
                    let response = ResponseTemplate::new(200).set_body_json(workflow);
                    match self.read_delay {
                        Some(delay) => response.set_delay(delay),
                        None => response,
                    }
                }
                None => not_found(),
            },
            ("PUT", Some(id)) => {
                if !store.contains_key(&id) {
                    return not_found();
                }
                let mut workflow: Value = serde_json::from_slice(&request.body).unwrap_or(json!({}));
                workflow["id"] = json!(id);
                store.insert(id, workflow.clone());
                ResponseTemplate::new(200).set_body_json(workflow)
            }
            ("DELETE", Some(id)) => match store.remove(&id) {
                Some(_) => ResponseTemplate::new(200),
                None => not_found(),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" }))
}

pub fn stored_workflow(id: &str, name: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "active": active,
        "nodes": [],
        "connections": {},
        "settings": { "timezone": "UTC", "saveExecutionProgress": true },
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-01T00:00:00.000Z"
    })
}

pub fn handler_for(server: &MockServer) -> McpHandler {
    let config = N8nConfig::new(format!("{}/api/v1", server.uri()), "test-key");
    let client = N8nClient::new(config).expect("client builds");
    let registry = ToolRegistry::with_n8n_tools().expect("registry builds");
    McpHandler::new(Arc::new(registry), client)
}

pub fn call(id: i64, tool: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(JsonRpcId::Number(id)),
        method: "tools/call".to_string(),
        params: json!({ "name": tool, "arguments": arguments }),
    }
}

/// Run a tool through the JSON-RPC handler and return the envelope
pub async fn call_tool(handler: &McpHandler, tool: &str, arguments: Value) -> Value {
    let response = handler.handle_request(call(1, tool, arguments)).await.expect("response");
    assert!(response.error.is_none(), "tools/call must not fault: {:?}", response.error);
    response.result.expect("result")
}

pub fn summary(envelope: &Value) -> &str {
    envelope["content"][0]["text"].as_str().unwrap_or_default()
}
