//! n8n Resource Models
//!
//! Pass-through representations of upstream resources. Fields this server does not
//! interpret are kept in `extra` so a fetched resource can be sent back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Baseline settings applied to newly created workflows.
///
/// Caller-supplied settings are merged over these keys.
pub fn default_workflow_settings() -> Map<String, Value> {
    let defaults = json!({
        "saveExecutionProgress": true,
        "saveManualExecutions": true,
        "saveDataErrorExecution": "all",
        "saveDataSuccessExecution": "all",
        "executionTimeout": 3600,
        "timezone": "UTC"
    });

    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Shallow-merge `overrides` into `base`; keys in `overrides` win.
pub fn merge_settings(base: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        base.insert(key.clone(), value.clone());
    }
}

/// Accept ids encoded as either strings or numbers
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// n8n workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Ordered node definitions (opaque to this server)
    #[serde(default)]
    pub nodes: Vec<Value>,

    /// Node name to downstream edges
    #[serde(default)]
    pub connections: Map<String, Value>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub settings: Map<String, Value>,

    #[serde(default)]
    pub tags: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workflow {
    /// Workflow id, or an empty string for unsaved workflows
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Compact summary used by list views
    pub fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "active": self.active,
            "nodeCount": self.nodes.len(),
            "createdAt": self.extra.get("createdAt"),
            "updatedAt": self.extra.get("updatedAt"),
        })
    }
}

/// Input for creating a workflow; unset fields receive defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl CreateWorkflowRequest {
    /// Build the workflow body sent upstream, filling defaults
    pub fn into_workflow(self) -> Workflow {
        let mut settings = default_workflow_settings();
        if let Some(overrides) = &self.settings {
            merge_settings(&mut settings, overrides);
        }

        Workflow {
            id: None,
            name: self.name,
            nodes: self.nodes.unwrap_or_default(),
            connections: self.connections.unwrap_or_default(),
            active: self.active.unwrap_or(false),
            settings,
            tags: self.tags.unwrap_or_default(),
            extra: Map::new(),
        }
    }
}

/// Fields a caller explicitly supplied for an update; `None` means "leave as is"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub nodes: Option<Vec<Value>>,
    pub connections: Option<Map<String, Value>>,
    pub active: Option<bool>,
    pub tags: Option<Vec<Value>>,
    /// Shallow-merged into the existing settings
    pub settings: Option<Map<String, Value>>,
}

impl WorkflowPatch {
    /// Whether no field was supplied
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the supplied fields onto `workflow`
    pub fn apply_to(&self, workflow: &mut Workflow) {
        if let Some(name) = &self.name {
            workflow.name = name.clone();
        }
        if let Some(nodes) = &self.nodes {
            workflow.nodes = nodes.clone();
        }
        if let Some(connections) = &self.connections {
            workflow.connections = connections.clone();
        }
        if let Some(active) = self.active {
            workflow.active = active;
        }
        if let Some(tags) = &self.tags {
            workflow.tags = tags.clone();
        }
        if let Some(settings) = &self.settings {
            merge_settings(&mut workflow.settings, settings);
        }
    }
}

/// n8n execution record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(default)]
    pub finished: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Execution {
    /// Effective status; older n8n versions only report `finished`
    pub fn effective_status(&self) -> &str {
        match self.status.as_deref() {
            Some(status) => status,
            None if self.finished => "success",
            None if self.stopped_at.is_some() => "error",
            None => "running",
        }
    }

    /// Wall-clock duration in milliseconds, when both timestamps parse
    pub fn duration_ms(&self) -> Option<i64> {
        let started = chrono::DateTime::parse_from_rfc3339(self.started_at.as_deref()?).ok()?;
        let stopped = chrono::DateTime::parse_from_rfc3339(self.stopped_at.as_deref()?).ok()?;
        Some((stopped - started).num_milliseconds())
    }

    /// Compact summary used by list views
    pub fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "workflowId": self.workflow_id,
            "status": self.effective_status(),
            "mode": self.mode,
            "startedAt": self.started_at,
            "stoppedAt": self.stopped_at,
        })
    }
}

/// Query filters for listing executions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionFilter {
    pub workflow_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub include_data: bool,
}

impl ExecutionFilter {
    /// Query parameters understood by `GET /executions`
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(workflow_id) = &self.workflow_id {
            pairs.push(("workflowId", workflow_id.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if self.include_data {
            pairs.push(("includeData", "true".to_string()));
        }
        pairs
    }
}

/// n8n tag
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// n8n credential metadata (secrets are never returned by the API)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub credential_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// n8n user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
