//! MCP Tools Module
//!
//! One module per n8n resource group. Each module exposes `*_tool()` definitions,
//! `execute_*` functions and a `handlers()` list consumed by the tool registry.

use serde::Deserialize;
use serde_json::{json, Value};

/// Implement [`ToolHandler`](crate::mcp::registry::ToolHandler) for a unit struct by
/// pairing a definition function with an execute function.
macro_rules! tool_handler {
    ($handler:ident, $definition:path, $execute:path) => {
        pub struct $handler;

        #[async_trait::async_trait]
        impl $crate::mcp::registry::ToolHandler for $handler {
            fn definition(&self) -> $crate::mcp::protocol::Tool {
                $definition()
            }

            async fn execute(
                &self,
                client: &$crate::n8n::N8nClient,
                arguments: serde_json::Value,
            ) -> Result<$crate::mcp::protocol::ToolCallResult, $crate::mcp::error::McpError> {
                $execute(client, arguments).await
            }
        }
    };
}

pub mod credentials;
pub mod executions;
pub mod tags;
pub mod users;
pub mod webhooks;
pub mod workflows;

pub use credentials::{execute_get_credential, execute_list_credentials};
pub use executions::{execute_delete_execution, execute_get_execution, execute_list_executions};
pub use tags::{
    execute_create_tag, execute_delete_tag, execute_get_tag, execute_list_tags, execute_update_tag,
};
pub use users::{execute_get_current_user, execute_list_users};
pub use webhooks::execute_run_webhook;
pub use workflows::{
    execute_activate_workflow, execute_create_workflow, execute_deactivate_workflow,
    execute_delete_workflow, execute_execute_workflow, execute_get_workflow,
    execute_list_workflows, execute_update_workflow,
};

/// Arguments of tools addressing one resource by id
#[derive(Debug, Deserialize)]
pub(crate) struct IdArgs {
    pub id: String,
}

/// Input schema for tools taking only a resource id
pub(crate) fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "id": {
                "type": "string",
                "minLength": 1,
                "description": description
            }
        },
        "required": ["id"]
    })
}

/// Input schema for tools without arguments
pub(crate) fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {}, "additionalProperties": false })
}
