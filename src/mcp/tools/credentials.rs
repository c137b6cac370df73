//! MCP Tools for n8n Credentials
//!
//! Metadata only; n8n never returns credential secrets through its API.

use serde_json::{json, Value};
use tracing::instrument;

use super::{empty_schema, id_schema, IdArgs};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::{parse_arguments, ToolHandler};
use crate::n8n::N8nClient;

tool_handler!(ListCredentials, list_credentials_tool, execute_list_credentials);
tool_handler!(GetCredential, get_credential_tool, execute_get_credential);

pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(ListCredentials), Box::new(GetCredential)]
}

pub fn list_credentials_tool() -> Tool {
    Tool::new(
        "list_credentials",
        "List credentials (name and type only) available to workflows.",
        empty_schema(),
    )
}

pub fn get_credential_tool() -> Tool {
    Tool::new(
        "get_credential",
        "Get credential metadata by id.",
        id_schema("The id of the credential"),
    )
}

#[instrument(skip(client, _args), name = "mcp_execute_list_credentials")]
pub async fn execute_list_credentials(
    client: &N8nClient,
    _args: Value,
) -> Result<ToolCallResult, McpError> {
    let credentials = client.list_credentials().await?;
    let count = credentials.len();

    Ok(ToolCallResult::success(
        format!("Found {} credential(s)", count),
        json!({ "credentials": credentials, "count": count }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_get_credential")]
pub async fn execute_get_credential(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let credential = client.get_credential(&id).await?;

    Ok(ToolCallResult::success(
        format!("Credential '{}' of type {}", credential.name, credential.credential_type),
        serde_json::to_value(&credential)?,
    ))
}
