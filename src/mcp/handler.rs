//! MCP Request Handler
//!
//! Routes incoming JSON-RPC requests to the appropriate method handlers.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::mcp::error::McpError;
use crate::mcp::protocol::*;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::resources;
use crate::n8n::N8nClient;

/// Stateless JSON-RPC router; cheap to clone into per-request tasks
#[derive(Debug, Clone)]
pub struct McpHandler {
    registry: Arc<ToolRegistry>,
    client: N8nClient,
}

impl McpHandler {
    pub fn new(registry: Arc<ToolRegistry>, client: N8nClient) -> Self {
        Self { registry, client }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw input line.
    ///
    /// Malformed JSON yields a parse error response with a null id; notifications
    /// yield `None`.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON-RPC request");
                Some(self.error_response(None, McpError::ParseError(e.to_string())))
            }
        }
    }

    /// Handle an incoming JSON-RPC request; notifications produce no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let method = request.method.clone();
        let id = request.id.clone();

        debug!(method = %method, id = ?id, "Handling MCP request");

        if request.is_notification() {
            self.handle_notification(&method);
            return None;
        }

        if request.jsonrpc != "2.0" {
            return Some(self.error_response(
                id,
                McpError::InvalidRequest(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
            ));
        }

        let response = match method.as_str() {
            "initialize" => self.handle_initialize(id.clone(), request.params),
            "ping" => JsonRpcResponse::success(id.clone(), json!({})),
            "tools/list" => self.handle_tools_list(id.clone()),
            "tools/call" => self.handle_tools_call(id.clone(), request.params).await,
            "resources/list" => self.handle_resources_list(id.clone()),
            "resources/templates/list" => self.handle_resource_templates_list(id.clone()),
            "resources/read" => self.handle_resources_read(id.clone(), request.params).await,
            other => self.error_response(id.clone(), McpError::MethodNotFound(other.to_string())),
        };

        debug!(
            method = %method,
            id = ?id,
            has_error = response.error.is_some(),
            "Completed MCP request"
        );

        Some(response)
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => debug!("Client initialized"),
            "notifications/cancelled" => debug!("Received cancellation notification"),
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        let params: InitializeRequest = if params.is_null() {
            InitializeRequest::default()
        } else {
            match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    error!(error = %e, "Failed to parse initialize params");
                    return self.error_response(
                        id,
                        McpError::InvalidParams(format!("Failed to parse initialize params: {}", e)),
                    );
                }
            }
        };

        let negotiated = negotiate_protocol_version(params.protocol_version.as_deref());
        debug!(
            client_version = ?params.protocol_version,
            client_name = ?params.client_info.as_ref().map(|c| c.name.as_str()),
            negotiated_version = %negotiated,
            "Received initialize request"
        );

        let result = InitializeResponse {
            protocol_version: negotiated.to_string(),
            capabilities: Capabilities {
                tools: Some(ToolCapabilities { list_changed: false }),
                resources: Some(ResourceCapabilities { subscribe: false, list_changed: false }),
            },
            server_info: ServerInfo {
                name: crate::APP_NAME.to_string(),
                version: crate::VERSION.to_string(),
            },
            instructions: Some(
                "Tools manage n8n workflows, executions, tags, credentials and users. \
                 Every tool returns a result; check isError to detect failures."
                    .to_string(),
            ),
        };

        self.to_response(id, &result)
    }

    fn handle_tools_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        let result = ToolsListResult { tools: self.registry.list_tools(), next_cursor: None };
        self.to_response(id, &result)
    }

    async fn handle_tools_call(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        let params: ToolCallRequest = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return self.error_response(
                    id,
                    McpError::InvalidParams(format!("Failed to parse tool call params: {}", e)),
                );
            }
        };

        let result = self.registry.call_tool(&self.client, &params.name, params.arguments).await;
        self.to_response(id, &result)
    }

    fn handle_resources_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        let result =
            ResourcesListResult { resources: resources::list_resources(), next_cursor: None };
        self.to_response(id, &result)
    }

    fn handle_resource_templates_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        let result = ResourceTemplatesListResult {
            resource_templates: resources::list_resource_templates(),
        };
        self.to_response(id, &result)
    }

    async fn handle_resources_read(&self, id: Option<JsonRpcId>, params: Value) -> JsonRpcResponse {
        let params: ResourceReadParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return self.error_response(
                    id,
                    McpError::InvalidParams(format!("Failed to parse resource read params: {}", e)),
                );
            }
        };

        match resources::read_resource(&self.client, &params.uri).await {
            Ok(content) => self.to_response(id, &ResourceReadResult { contents: vec![content] }),
            Err(e) => {
                error!(uri = %params.uri, error = %e, "Failed to read resource");
                self.error_response(id, e)
            }
        }
    }

    fn to_response<T: serde::Serialize>(&self, id: Option<JsonRpcId>, result: &T) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => self.error_response(id, McpError::SerializationError(e)),
        }
    }

    fn error_response(&self, id: Option<JsonRpcId>, error: McpError) -> JsonRpcResponse {
        JsonRpcResponse::failure(id, error.to_json_rpc_error())
    }
}
