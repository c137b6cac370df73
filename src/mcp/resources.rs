//! MCP Resources Module
//!
//! Read-only summaries of n8n state addressable by URI:
//!
//! - `n8n://workflows`: summary of every workflow
//! - `n8n://execution-stats`: statistics over recent executions
//! - `n8n://workflows/{id}` and `n8n://executions/{id}`: single resources

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::debug;

use crate::mcp::error::McpError;
use crate::mcp::protocol::{Resource, ResourceContent, ResourceTemplate};
use crate::n8n::{Execution, ExecutionFilter, N8nClient, Workflow};

/// URI scheme prefix of every resource
pub const SCHEME: &str = "n8n://";

/// Number of recent executions the statistics cover
pub const STATS_SAMPLE_SIZE: u32 = 100;

const JSON_MIME: &str = "application/json";

/// Parsed resource URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Workflows,
    ExecutionStats,
    Workflow(String),
    Execution(String),
}

impl ResourceUri {
    /// Parse a resource URI string
    pub fn parse(uri: &str) -> Result<Self, McpError> {
        let path = uri.strip_prefix(SCHEME).ok_or_else(|| {
            McpError::InvalidParams(format!(
                "Invalid resource URI scheme. Expected '{}', got: {}",
                SCHEME, uri
            ))
        })?;

        match path.split_once('/') {
            None => match path {
                "workflows" => Ok(ResourceUri::Workflows),
                "execution-stats" => Ok(ResourceUri::ExecutionStats),
                _ => Err(McpError::ResourceNotFound(uri.to_string())),
            },
            Some((kind, id)) if !id.is_empty() && !id.contains('/') => match kind {
                "workflows" => Ok(ResourceUri::Workflow(id.to_string())),
                "executions" => Ok(ResourceUri::Execution(id.to_string())),
                _ => Err(McpError::ResourceNotFound(uri.to_string())),
            },
            Some(_) => Err(McpError::ResourceNotFound(uri.to_string())),
        }
    }

    /// Build a resource URI string
    pub fn to_uri(&self) -> String {
        match self {
            ResourceUri::Workflows => format!("{}workflows", SCHEME),
            ResourceUri::ExecutionStats => format!("{}execution-stats", SCHEME),
            ResourceUri::Workflow(id) => format!("{}workflows/{}", SCHEME, id),
            ResourceUri::Execution(id) => format!("{}executions/{}", SCHEME, id),
        }
    }
}

/// Static resources
pub fn list_resources() -> Vec<Resource> {
    vec![
        Resource {
            uri: ResourceUri::Workflows.to_uri(),
            name: "workflows".to_string(),
            description: Some("Summary of all n8n workflows".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
        Resource {
            uri: ResourceUri::ExecutionStats.to_uri(),
            name: "execution-stats".to_string(),
            description: Some(format!(
                "Execution statistics over the {} most recent executions",
                STATS_SAMPLE_SIZE
            )),
            mime_type: Some(JSON_MIME.to_string()),
        },
    ]
}

/// Parameterized resources
pub fn list_resource_templates() -> Vec<ResourceTemplate> {
    vec![
        ResourceTemplate {
            uri_template: format!("{}workflows/{{id}}", SCHEME),
            name: "workflow".to_string(),
            description: Some("A single workflow by id".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
        ResourceTemplate {
            uri_template: format!("{}executions/{{id}}", SCHEME),
            name: "execution".to_string(),
            description: Some("A single execution by id".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
    ]
}

/// Resolve a resource URI against the n8n API
pub async fn read_resource(client: &N8nClient, uri: &str) -> Result<ResourceContent, McpError> {
    let parsed = ResourceUri::parse(uri)?;
    debug!(uri = %uri, "Reading resource");

    let body = match &parsed {
        ResourceUri::Workflows => {
            let workflows = client.list_workflows().await?;
            let summaries: Vec<Value> = workflows.iter().map(Workflow::summary).collect();
            json!({ "workflows": summaries, "count": workflows.len() })
        }
        ResourceUri::ExecutionStats => {
            let filter =
                ExecutionFilter { limit: Some(STATS_SAMPLE_SIZE), ..Default::default() };
            execution_stats(&client.list_executions(&filter).await?)
        }
        ResourceUri::Workflow(id) => serde_json::to_value(client.get_workflow(id).await?)?,
        ResourceUri::Execution(id) => serde_json::to_value(client.get_execution(id).await?)?,
    };

    Ok(ResourceContent {
        uri: parsed.to_uri(),
        mime_type: Some(JSON_MIME.to_string()),
        text: Some(serde_json::to_string_pretty(&body)?),
    })
}

/// Aggregate statistics over a sample of executions.
///
/// The success rate is a percentage rounded to two decimals; the average duration only
/// counts executions with both timestamps.
pub fn execution_stats(executions: &[Execution]) -> Value {
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for execution in executions {
        *by_status.entry(execution.effective_status().to_string()).or_default() += 1;
    }

    let total = executions.len();
    let succeeded = by_status.get("success").copied().unwrap_or(0);
    let success_rate = if total == 0 {
        0.0
    } else {
        ((succeeded as f64 / total as f64) * 10_000.0).round() / 100.0
    };

    let durations: Vec<i64> = executions.iter().filter_map(Execution::duration_ms).collect();
    let average_duration_ms = if durations.is_empty() {
        Value::Null
    } else {
        json!(durations.iter().sum::<i64>() / durations.len() as i64)
    };

    json!({
        "total": total,
        "byStatus": by_status,
        "successRate": success_rate,
        "averageDurationMs": average_duration_ms,
        "sampleSize": STATS_SAMPLE_SIZE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(status: &str, started: &str, stopped: Option<&str>) -> Execution {
        serde_json::from_value(json!({
            "id": "1",
            "status": status,
            "startedAt": started,
            "stoppedAt": stopped,
        }))
        .expect("execution")
    }

    #[test]
    fn test_parse_static_uris() {
        assert_eq!(ResourceUri::parse("n8n://workflows").unwrap(), ResourceUri::Workflows);
        assert_eq!(
            ResourceUri::parse("n8n://execution-stats").unwrap(),
            ResourceUri::ExecutionStats
        );
    }

    #[test]
    fn test_parse_templated_uris() {
        assert_eq!(
            ResourceUri::parse("n8n://workflows/abc").unwrap(),
            ResourceUri::Workflow("abc".to_string())
        );
        assert_eq!(
            ResourceUri::parse("n8n://executions/42").unwrap(),
            ResourceUri::Execution("42".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_uris() {
        assert!(matches!(
            ResourceUri::parse("flowchart://workflows"),
            Err(McpError::InvalidParams(_))
        ));
        assert!(matches!(ResourceUri::parse("n8n://nodes"), Err(McpError::ResourceNotFound(_))));
        assert!(matches!(
            ResourceUri::parse("n8n://workflows/"),
            Err(McpError::ResourceNotFound(_))
        ));
        assert!(matches!(
            ResourceUri::parse("n8n://workflows/a/b"),
            Err(McpError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_uri_round_trip() {
        for uri in ["n8n://workflows", "n8n://execution-stats", "n8n://executions/7"] {
            assert_eq!(ResourceUri::parse(uri).unwrap().to_uri(), uri);
        }
    }

    #[test]
    fn test_execution_stats() {
        let executions = vec![
            execution("success", "2024-01-01T00:00:00Z", Some("2024-01-01T00:00:01Z")),
            execution("success", "2024-01-01T00:00:00Z", Some("2024-01-01T00:00:03Z")),
            execution("error", "2024-01-01T00:00:00Z", Some("2024-01-01T00:00:02Z")),
            execution("running", "2024-01-01T00:00:00Z", None),
        ];

        let stats = execution_stats(&executions);
        assert_eq!(stats["total"], json!(4));
        assert_eq!(stats["byStatus"]["success"], json!(2));
        assert_eq!(stats["byStatus"]["error"], json!(1));
        assert_eq!(stats["byStatus"]["running"], json!(1));
        assert_eq!(stats["successRate"], json!(50.0));
        assert_eq!(stats["averageDurationMs"], json!(2000));
    }

    #[test]
    fn test_execution_stats_empty() {
        let stats = execution_stats(&[]);
        assert_eq!(stats["total"], json!(0));
        assert_eq!(stats["successRate"], json!(0.0));
        assert!(stats["averageDurationMs"].is_null());
    }

    #[test]
    fn test_static_resource_listing() {
        let names: Vec<String> = list_resources().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["workflows", "execution-stats"]);
        assert_eq!(list_resource_templates().len(), 2);
    }
}
