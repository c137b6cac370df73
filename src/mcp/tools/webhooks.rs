//! MCP Tool for triggering workflows through their webhook

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::registry::{parse_arguments, ToolHandler};
use crate::n8n::N8nClient;

tool_handler!(RunWebhook, run_webhook_tool, execute_run_webhook);

pub fn handlers() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(RunWebhook)]
}

/// Returns the MCP tool definition for calling a workflow webhook.
///
/// `workflowName` is the webhook path configured on the workflow's Webhook node.
pub fn run_webhook_tool() -> Tool {
    Tool::new(
        "run_webhook",
        "Trigger a workflow through its webhook. Sends a POST to <instance>/webhook/<workflowName>, using basic auth when webhook credentials are configured.",
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "workflowName": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Webhook path of the workflow"
                },
                "data": {
                    "type": "object",
                    "description": "JSON body sent to the webhook"
                },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Extra HTTP headers"
                }
            },
            "required": ["workflowName"]
        }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunWebhookArgs {
    workflow_name: String,
    data: Option<Value>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

#[instrument(skip(client, args), name = "mcp_execute_run_webhook")]
pub async fn execute_run_webhook(
    client: &N8nClient,
    args: Value,
) -> Result<ToolCallResult, McpError> {
    let args: RunWebhookArgs = parse_arguments(args)?;
    let headers: Vec<(String, String)> = args.headers.into_iter().collect();

    let response = client.run_webhook(&args.workflow_name, args.data.as_ref(), &headers).await?;

    tracing::info!(webhook = %args.workflow_name, "Webhook triggered");

    Ok(ToolCallResult::success(
        format!("Webhook '{}' triggered", args.workflow_name),
        json!({ "webhook": args.workflow_name, "response": response }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::N8nConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_run_webhook_posts_data_to_instance_root() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/signup"))
            .and(body_json(json!({ "email": "a@b.c" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            N8nClient::new(N8nConfig::new(format!("{}/api/v1", server.uri()), "key")).expect("client");
        let result = execute_run_webhook(
            &client,
            json!({ "workflowName": "signup", "data": { "email": "a@b.c" } }),
        )
        .await
        .expect("webhook succeeds");

        let payload = result.structured_content.expect("payload");
        assert_eq!(payload["response"], json!({ "ok": true }));
    }
}
