//! MCP Tools for n8n Tags

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::{empty_schema, id_schema, IdArgs};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::{parse_arguments, ToolHandler};
use crate::n8n::N8nClient;

tool_handler!(ListTags, list_tags_tool, execute_list_tags);
tool_handler!(GetTag, get_tag_tool, execute_get_tag);
tool_handler!(CreateTag, create_tag_tool, execute_create_tag);
tool_handler!(UpdateTag, update_tag_tool, execute_update_tag);
tool_handler!(DeleteTag, delete_tag_tool, execute_delete_tag);

pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(ListTags),
        Box::new(GetTag),
        Box::new(CreateTag),
        Box::new(UpdateTag),
        Box::new(DeleteTag),
    ]
}

pub fn list_tags_tool() -> Tool {
    Tool::new("list_tags", "List all workflow tags.", empty_schema())
}

pub fn get_tag_tool() -> Tool {
    Tool::new("get_tag", "Get a tag by id.", id_schema("The id of the tag to retrieve"))
}

pub fn create_tag_tool() -> Tool {
    Tool::new(
        "create_tag",
        "Create a new tag.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": { "type": "string", "minLength": 1, "description": "Tag name" }
            },
            "required": ["name"]
        }),
    )
}

pub fn update_tag_tool() -> Tool {
    Tool::new(
        "update_tag",
        "Rename an existing tag.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "id": { "type": "string", "minLength": 1, "description": "The id of the tag" },
                "name": { "type": "string", "minLength": 1, "description": "New tag name" }
            },
            "required": ["id", "name"]
        }),
    )
}

pub fn delete_tag_tool() -> Tool {
    Tool::new("delete_tag", "Delete a tag by id.", id_schema("The id of the tag to delete"))
}

#[derive(Debug, Deserialize)]
struct CreateTagArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTagArgs {
    id: String,
    name: String,
}

#[instrument(skip(client, _args), name = "mcp_execute_list_tags")]
pub async fn execute_list_tags(
    client: &N8nClient,
    _args: Value,
) -> Result<ToolCallResult, McpError> {
    let tags = client.list_tags().await?;
    let count = tags.len();
    Ok(ToolCallResult::success(
        format!("Found {} tag(s)", count),
        json!({ "tags": tags, "count": count }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_get_tag")]
pub async fn execute_get_tag(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let tag = client.get_tag(&id).await?;

    Ok(ToolCallResult::success(format!("Tag {} is '{}'", id, tag.name), serde_json::to_value(&tag)?))
}

#[instrument(skip(client, args), name = "mcp_execute_create_tag")]
pub async fn execute_create_tag(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let CreateTagArgs { name } = parse_arguments(args)?;
    let tag = client.create_tag(&name).await?;

    Ok(ToolCallResult::success(
        format!("Created tag '{}' with id {}", tag.name, tag.id.as_deref().unwrap_or("?")),
        serde_json::to_value(&tag)?,
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_update_tag")]
pub async fn execute_update_tag(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let UpdateTagArgs { id, name } = parse_arguments(args)?;
    let tag = client.update_tag(&id, &name).await?;

    Ok(ToolCallResult::success(format!("Tag {} renamed to '{}'", id, tag.name), serde_json::to_value(&tag)?))
}

#[instrument(skip(client, args), name = "mcp_execute_delete_tag")]
pub async fn execute_delete_tag(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    client.delete_tag(&id).await?;

    Ok(ToolCallResult::success(format!("Tag {} deleted", id), json!({ "id": id, "deleted": true })))
}
