//! MCP Tools for n8n Users

use serde_json::{json, Value};
use tracing::instrument;

use super::empty_schema;
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::ToolHandler;
use crate::n8n::N8nClient;

tool_handler!(ListUsers, list_users_tool, execute_list_users);
tool_handler!(GetCurrentUser, get_current_user_tool, execute_get_current_user);

pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(ListUsers), Box::new(GetCurrentUser)]
}

pub fn list_users_tool() -> Tool {
    Tool::new("list_users", "List users of the n8n instance.", empty_schema())
}

pub fn get_current_user_tool() -> Tool {
    Tool::new("get_current_user", "Get the user that owns the configured API key.", empty_schema())
}

#[instrument(skip(client, _args), name = "mcp_execute_list_users")]
pub async fn execute_list_users(
    client: &N8nClient,
    _args: Value,
) -> Result<ToolCallResult, McpError> {
    let users = client.list_users().await?;
    let count = users.len();

    Ok(ToolCallResult::success(
        format!("Found {} user(s)", count),
        json!({ "users": users, "count": count }),
    ))
}

#[instrument(skip(client, _args), name = "mcp_execute_get_current_user")]
pub async fn execute_get_current_user(
    client: &N8nClient,
    _args: Value,
) -> Result<ToolCallResult, McpError> {
    let user = client.get_current_user().await?;

    let summary = match user.role.as_deref() {
        Some(role) => format!("Authenticated as {} ({})", user.email, role),
        None => format!("Authenticated as {}", user.email),
    };
    Ok(ToolCallResult::success(summary, serde_json::to_value(&user)?))
}
