//! MCP Tools for n8n Workflows
//!
//! List, inspect, create, update, delete, (de)activate and run workflows.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::{id_schema, IdArgs};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::{parse_arguments, ToolHandler};
use crate::n8n::{CreateWorkflowRequest, N8nClient, Workflow, WorkflowPatch};

/// Summary text of an update that changed nothing
pub const NO_CHANGES: &str = "No changes were made";

tool_handler!(ListWorkflows, list_workflows_tool, execute_list_workflows);
tool_handler!(GetWorkflow, get_workflow_tool, execute_get_workflow);
tool_handler!(CreateWorkflow, create_workflow_tool, execute_create_workflow);
tool_handler!(UpdateWorkflow, update_workflow_tool, execute_update_workflow);
tool_handler!(DeleteWorkflow, delete_workflow_tool, execute_delete_workflow);
tool_handler!(ActivateWorkflow, activate_workflow_tool, execute_activate_workflow);
tool_handler!(DeactivateWorkflow, deactivate_workflow_tool, execute_deactivate_workflow);
tool_handler!(ExecuteWorkflow, execute_workflow_tool, execute_execute_workflow);

/// Handlers for every workflow tool
pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(ListWorkflows),
        Box::new(GetWorkflow),
        Box::new(CreateWorkflow),
        Box::new(UpdateWorkflow),
        Box::new(DeleteWorkflow),
        Box::new(ActivateWorkflow),
        Box::new(DeactivateWorkflow),
        Box::new(ExecuteWorkflow),
    ]
}

// ---- definitions ----

pub fn list_workflows_tool() -> Tool {
    Tool::new(
        "list_workflows",
        "List all workflows in n8n. Returns id, name, active flag, node count and timestamps for each workflow.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "active": {
                    "type": "boolean",
                    "description": "Only return workflows with this active state"
                }
            }
        }),
    )
}

pub fn get_workflow_tool() -> Tool {
    Tool::new(
        "get_workflow",
        "Get the complete definition of a workflow by id, including nodes, connections and settings.",
        id_schema("The id of the workflow to retrieve"),
    )
}

/// Returns the MCP tool definition for creating a workflow.
///
/// Only `name` is required; settings are merged over the server's baseline.
pub fn create_workflow_tool() -> Tool {
    Tool::new(
        "create_workflow",
        "Create a new workflow. Nodes, connections and tags default to empty; settings are merged over defaults (save execution progress, keep all execution data, 1 hour timeout, UTC).",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Name of the new workflow"
                },
                "nodes": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Ordered node definitions"
                },
                "connections": {
                    "type": "object",
                    "description": "Mapping of node name to downstream connections"
                },
                "settings": {
                    "type": "object",
                    "description": "Workflow settings merged over the defaults"
                },
                "tags": {
                    "type": "array",
                    "description": "Tag references"
                },
                "active": {
                    "type": "boolean",
                    "description": "Whether the workflow starts active"
                }
            },
            "required": ["name"]
        }),
    )
}

/// Returns the MCP tool definition for updating a workflow.
///
/// The workflow is addressed by its current name, not its id.
pub fn update_workflow_tool() -> Tool {
    Tool::new(
        "update_workflow",
        "Update an existing workflow looked up by its current name. Only supplied fields change; settings are shallow-merged. Reports which fields changed.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Current name of the workflow to update"
                },
                "newName": {
                    "type": "string",
                    "minLength": 1,
                    "description": "New name for the workflow"
                },
                "nodes": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Replacement node definitions"
                },
                "connections": {
                    "type": "object",
                    "description": "Replacement connection mapping"
                },
                "active": {
                    "type": "boolean",
                    "description": "New active state"
                },
                "tags": {
                    "type": "array",
                    "description": "Replacement tag references"
                },
                "settings": {
                    "type": "object",
                    "description": "Settings merged over the current settings"
                }
            },
            "required": ["name"]
        }),
    )
}

pub fn delete_workflow_tool() -> Tool {
    Tool::new(
        "delete_workflow",
        "Permanently delete a workflow by id.",
        id_schema("The id of the workflow to delete"),
    )
}

pub fn activate_workflow_tool() -> Tool {
    Tool::new(
        "activate_workflow",
        "Activate a workflow so its triggers start listening. Activating an active workflow is a no-op.",
        id_schema("The id of the workflow to activate"),
    )
}

pub fn deactivate_workflow_tool() -> Tool {
    Tool::new(
        "deactivate_workflow",
        "Deactivate a workflow so its triggers stop listening. Deactivating an inactive workflow is a no-op.",
        id_schema("The id of the workflow to deactivate"),
    )
}

pub fn execute_workflow_tool() -> Tool {
    Tool::new(
        "execute_workflow",
        "Run a workflow immediately, optionally passing input data.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "id": {
                    "type": "string",
                    "minLength": 1,
                    "description": "The id of the workflow to run"
                },
                "data": {
                    "type": "object",
                    "description": "Input data passed to the workflow"
                }
            },
            "required": ["id"]
        }),
    )
}

// ---- argument types ----

#[derive(Debug, Default, Deserialize)]
struct ListWorkflowsArgs {
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWorkflowArgs {
    name: String,
    new_name: Option<String>,
    nodes: Option<Vec<Value>>,
    connections: Option<Map<String, Value>>,
    active: Option<bool>,
    tags: Option<Vec<Value>>,
    settings: Option<Map<String, Value>>,
}

impl UpdateWorkflowArgs {
    fn into_patch(self) -> WorkflowPatch {
        WorkflowPatch {
            name: self.new_name,
            nodes: self.nodes,
            connections: self.connections,
            active: self.active,
            tags: self.tags,
            settings: self.settings,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteWorkflowArgs {
    id: String,
    data: Option<Value>,
}

// ---- execution ----

#[instrument(skip(client, args), name = "mcp_execute_list_workflows")]
pub async fn execute_list_workflows(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let args: ListWorkflowsArgs = parse_arguments(args)?;

    let workflows: Vec<Workflow> = client
        .list_workflows()
        .await?
        .into_iter()
        .filter(|w| args.active.map_or(true, |active| w.active == active))
        .collect();

    let summaries: Vec<Value> = workflows.iter().map(Workflow::summary).collect();
    let active_count = workflows.iter().filter(|w| w.active).count();

    tracing::info!(workflow_count = workflows.len(), "Successfully listed workflows");

    Ok(ToolCallResult::success(
        format!("Found {} workflow(s) ({} active)", workflows.len(), active_count),
        json!({ "workflows": summaries, "count": workflows.len() }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_get_workflow")]
pub async fn execute_get_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let workflow = client.get_workflow(&id).await?;

    let summary = format!(
        "Workflow '{}' ({}) is {} with {} node(s)",
        workflow.name,
        workflow.id_str(),
        state_label(workflow.active),
        workflow.nodes.len()
    );
    Ok(ToolCallResult::success(summary, serde_json::to_value(&workflow)?))
}

#[instrument(skip(client, args), name = "mcp_execute_create_workflow")]
pub async fn execute_create_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let request: CreateWorkflowRequest = parse_arguments(args)?;
    let workflow = client.create_workflow(request).await?;

    tracing::info!(workflow_id = %workflow.id_str(), "Created workflow");

    Ok(ToolCallResult::success(
        format!("Created workflow '{}' with id {}", workflow.name, workflow.id_str()),
        serde_json::to_value(&workflow)?,
    ))
}

/// Execute the update_workflow tool.
///
/// Looks the workflow up by name over the full list, then updates it by id. The update
/// itself re-fetches the workflow before writing, so a concurrent update to the same
/// workflow may be silently overwritten.
#[instrument(skip(client, args), name = "mcp_execute_update_workflow")]
pub async fn execute_update_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let args: UpdateWorkflowArgs = parse_arguments(args)?;
    let lookup_name = args.name.clone();

    let existing = client
        .list_workflows()
        .await?
        .into_iter()
        .find(|w| w.name == lookup_name)
        .ok_or_else(|| McpError::NotFound(format!("Workflow not found: {}", lookup_name)))?;

    let id = existing
        .id
        .clone()
        .ok_or_else(|| McpError::NotFound(format!("Workflow '{}' has no id", lookup_name)))?;

    let patch = args.into_patch();
    let updated = client.update_workflow(&id, &patch).await?;
    let changes = describe_changes(&existing, &updated, &patch);

    tracing::info!(workflow_id = %id, change_count = changes.len(), "Updated workflow");

    let summary = if changes.is_empty() {
        NO_CHANGES.to_string()
    } else {
        format!("Updated workflow '{}':\n{}", updated.name, changes.join("\n"))
    };

    Ok(ToolCallResult::success(
        summary,
        json!({
            "id": updated.id.clone().unwrap_or(id),
            "name": updated.name,
            "active": updated.active,
            "changes": changes,
        }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_delete_workflow")]
pub async fn execute_delete_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    client.delete_workflow(&id).await?;

    tracing::info!(workflow_id = %id, "Deleted workflow");

    Ok(ToolCallResult::success(
        format!("Workflow {} deleted", id),
        json!({ "id": id, "deleted": true }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_activate_workflow")]
pub async fn execute_activate_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let workflow = client.activate_workflow(&id).await?;
    Ok(state_result(&id, &workflow, true))
}

#[instrument(skip(client, args), name = "mcp_execute_deactivate_workflow")]
pub async fn execute_deactivate_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let workflow = client.deactivate_workflow(&id).await?;
    Ok(state_result(&id, &workflow, false))
}

#[instrument(skip(client, args), name = "mcp_execute_execute_workflow")]
pub async fn execute_execute_workflow(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let ExecuteWorkflowArgs { id, data } = parse_arguments(args)?;
    let response = client.execute_workflow(&id, data.as_ref()).await?;

    let execution_id = response
        .get("executionId")
        .or_else(|| response.get("id"))
        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));

    let summary = match execution_id {
        Some(execution_id) => format!("Workflow {} started (execution {})", id, execution_id),
        None => format!("Workflow {} started", id),
    };
    Ok(ToolCallResult::success(summary, json!({ "id": id, "response": response })))
}

// ---- formatting ----

fn state_label(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

fn state_result(id: &str, workflow: &Workflow, requested: bool) -> ToolCallResult {
    // Some n8n versions answer activation with an empty body.
    let (name, active) = if workflow.name.is_empty() {
        (Value::Null, requested)
    } else {
        (Value::String(workflow.name.clone()), workflow.active)
    };

    ToolCallResult::success(
        format!("Workflow {} is now {}", id, state_label(active)),
        json!({ "id": id, "name": name, "active": active }),
    )
}

/// Field-by-field differences between the workflow before and after the update,
/// restricted to the fields the caller supplied.
fn describe_changes(before: &Workflow, after: &Workflow, patch: &WorkflowPatch) -> Vec<String> {
    let mut changes = Vec::new();

    if patch.name.is_some() && before.name != after.name {
        changes.push(format!("name: {} → {}", json!(before.name), json!(after.name)));
    }
    if patch.active.is_some() && before.active != after.active {
        changes.push(format!("active: {} → {}", before.active, after.active));
    }
    if patch.nodes.is_some() && before.nodes != after.nodes {
        changes.push(format!("nodes: {} → {}", before.nodes.len(), after.nodes.len()));
    }
    if patch.connections.is_some() && before.connections != after.connections {
        changes.push("connections: updated".to_string());
    }
    if patch.tags.is_some() && before.tags != after.tags {
        changes.push("tags: updated".to_string());
    }
    if let Some(settings) = &patch.settings {
        for (key, value) in settings {
            let old = before.settings.get(key).cloned().unwrap_or(Value::Null);
            let new = after.settings.get(key).cloned().unwrap_or_else(|| value.clone());
            if old != new {
                changes.push(format!("settings.{}: {} → {}", key, old, new));
            }
        }
    }

    changes
}
