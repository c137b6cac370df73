//! MCP Tools for n8n Executions
//!
//! Executions are created as a side effect of running workflows; these tools only read
//! and delete them.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::{id_schema, IdArgs};
use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::{parse_arguments, ToolHandler};
use crate::n8n::{Execution, ExecutionFilter, N8nClient};

/// Default page size for `list_executions`
const DEFAULT_LIMIT: u32 = 20;

tool_handler!(ListExecutions, list_executions_tool, execute_list_executions);
tool_handler!(GetExecution, get_execution_tool, execute_get_execution);
tool_handler!(DeleteExecution, delete_execution_tool, execute_delete_execution);

pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(ListExecutions), Box::new(GetExecution), Box::new(DeleteExecution)]
}

/// Returns the MCP tool definition for listing executions.
///
/// Supports filtering by workflow and status.
pub fn list_executions_tool() -> Tool {
    Tool::new(
        "list_executions",
        "List workflow executions, most recent first. Filter by workflow id or status; set includeData to return full execution data.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "workflowId": {
                    "type": "string",
                    "description": "Only return executions of this workflow"
                },
                "status": {
                    "type": "string",
                    "enum": ["success", "error", "waiting", "running", "canceled"],
                    "description": "Only return executions with this status"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 250,
                    "default": DEFAULT_LIMIT,
                    "description": "Maximum number of executions to return"
                },
                "includeData": {
                    "type": "boolean",
                    "default": false,
                    "description": "Include the full execution data"
                }
            }
        }),
    )
}

pub fn get_execution_tool() -> Tool {
    Tool::new(
        "get_execution",
        "Get a single execution by id, including its result data.",
        id_schema("The id of the execution"),
    )
}

pub fn delete_execution_tool() -> Tool {
    Tool::new(
        "delete_execution",
        "Delete an execution record by id.",
        id_schema("The id of the execution to delete"),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExecutionsArgs {
    workflow_id: Option<String>,
    status: Option<String>,
    limit: Option<u32>,
    #[serde(default)]
    include_data: bool,
}

impl From<ListExecutionsArgs> for ExecutionFilter {
    fn from(args: ListExecutionsArgs) -> Self {
        ExecutionFilter {
            workflow_id: args.workflow_id,
            status: args.status,
            limit: Some(args.limit.unwrap_or(DEFAULT_LIMIT)),
            include_data: args.include_data,
        }
    }
}

#[instrument(skip(client, args), name = "mcp_execute_list_executions")]
pub async fn execute_list_executions(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let filter: ExecutionFilter = parse_arguments::<ListExecutionsArgs>(args)?.into();
    let executions = client.list_executions(&filter).await?;

    let entries: Vec<Value> = if filter.include_data {
        executions.iter().map(serde_json::to_value).collect::<Result<_, _>>()?
    } else {
        executions.iter().map(Execution::summary).collect()
    };

    let failed = executions.iter().filter(|e| e.effective_status() == "error").count();

    tracing::debug!(execution_count = executions.len(), "Listed executions");

    Ok(ToolCallResult::success(
        format!("Found {} execution(s) ({} failed)", executions.len(), failed),
        json!({ "executions": entries, "count": executions.len() }),
    ))
}

#[instrument(skip(client, args), name = "mcp_execute_get_execution")]
pub async fn execute_get_execution(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    let execution = client.get_execution(&id).await?;

    let mut summary = format!("Execution {} finished with status '{}'", id, execution.effective_status());
    if let Some(workflow_id) = &execution.workflow_id {
        summary.push_str(&format!(" (workflow {})", workflow_id));
    }
    if let Some(ms) = execution.duration_ms() {
        summary.push_str(&format!(" in {} ms", ms));
    }

    Ok(ToolCallResult::success(summary, serde_json::to_value(&execution)?))
}

#[instrument(skip(client, args), name = "mcp_execute_delete_execution")]
pub async fn execute_delete_execution(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let IdArgs { id } = parse_arguments(args)?;
    client.delete_execution(&id).await?;

    Ok(ToolCallResult::success(
        format!("Execution {} deleted", id),
        json!({ "id": id, "deleted": true }),
    ))
}
