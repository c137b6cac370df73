//! n8n API Gateway Client
//!
//! Single chokepoint for all upstream HTTP traffic. Every method issues exactly one
//! request (two for [`N8nClient::update_workflow`]) and normalizes every failure into
//! [`N8nApiError`].

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn, Instrument};
use url::Url;

use super::error::N8nApiError;
use super::models::{
    CreateWorkflowRequest, Credential, Execution, ExecutionFilter, Tag, User, Workflow,
    WorkflowPatch,
};
use crate::config::N8nConfig;

/// Header carrying the pre-issued API key
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Authenticated HTTP client for the n8n REST API
#[derive(Debug, Clone)]
pub struct N8nClient {
    http: Client,
    config: Arc<N8nConfig>,
}

impl N8nClient {
    /// Create a new client from validated configuration
    pub fn new(config: N8nConfig) -> Result<Self, N8nApiError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(N8nApiError::from_reqwest)?;

        Ok(Self { http, config: Arc::new(config) })
    }

    /// Configuration the client was built from
    pub fn config(&self) -> &N8nConfig {
        &self.config
    }

    // ---- workflows ----

    /// Probe the API with a minimal list request
    pub async fn check_connectivity(&self) -> Result<(), N8nApiError> {
        let url = self.api_url(&["workflows"])?;
        self.send(Method::GET, url, &[("limit", "1".to_string())], None).await?;
        Ok(())
    }

    /// List all workflows
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, N8nApiError> {
        let url = self.api_url(&["workflows"])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode_list(body, "workflows")
    }

    /// Get one workflow by id
    pub async fn get_workflow(&self, id: &str) -> Result<Workflow, N8nApiError> {
        let url = self.api_url(&["workflows", id])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode(body, "workflow")
    }

    /// Create a workflow; unset fields receive their defaults
    pub async fn create_workflow(
        &self,
        request: CreateWorkflowRequest,
    ) -> Result<Workflow, N8nApiError> {
        let workflow = request.into_workflow();
        let body = encode(&workflow)?;

        let url = self.api_url(&["workflows"])?;
        let created = self.send(Method::POST, url, &[], Some(&body)).await?;
        decode(created, "workflow")
    }

    /// Update a workflow by fetching it, overlaying `patch` and sending the merged object.
    ///
    /// This is a read-modify-write: a concurrent writer updating the same workflow between
    /// the GET and the PUT has its change overwritten.
    pub async fn update_workflow(
        &self,
        id: &str,
        patch: &WorkflowPatch,
    ) -> Result<Workflow, N8nApiError> {
        let mut current = self.get_workflow(id).await?;
        patch.apply_to(&mut current);

        let body = encode(&writable_workflow(&current))?;
        let url = self.api_url(&["workflows", id])?;
        let updated = self.send(Method::PUT, url, &[], Some(&body)).await?;
        decode(updated, "workflow")
    }

    /// Delete a workflow; an empty response body counts as success
    pub async fn delete_workflow(&self, id: &str) -> Result<Value, N8nApiError> {
        let url = self.api_url(&["workflows", id])?;
        self.send(Method::DELETE, url, &[], None).await
    }

    /// Activate a workflow
    pub async fn activate_workflow(&self, id: &str) -> Result<Workflow, N8nApiError> {
        let url = self.api_url(&["workflows", id, "activate"])?;
        let body = self.send(Method::POST, url, &[], None).await?;
        decode_or_default(body, "workflow")
    }

    /// Deactivate a workflow
    pub async fn deactivate_workflow(&self, id: &str) -> Result<Workflow, N8nApiError> {
        let url = self.api_url(&["workflows", id, "deactivate"])?;
        let body = self.send(Method::POST, url, &[], None).await?;
        decode_or_default(body, "workflow")
    }

    /// Run a workflow with optional input data
    pub async fn execute_workflow(&self, id: &str, data: Option<&Value>) -> Result<Value, N8nApiError> {
        let url = self.api_url(&["workflows", id, "execute"])?;
        let body = data.cloned().unwrap_or_else(|| json!({}));
        self.send(Method::POST, url, &[], Some(&body)).await
    }

    // ---- executions ----

    /// List executions matching `filter`
    pub async fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, N8nApiError> {
        let url = self.api_url(&["executions"])?;
        let body = self.send(Method::GET, url, &filter.query_pairs(), None).await?;
        decode_list(body, "executions")
    }

    /// Get one execution, including its result data
    pub async fn get_execution(&self, id: &str) -> Result<Execution, N8nApiError> {
        let url = self.api_url(&["executions", id])?;
        let body = self
            .send(Method::GET, url, &[("includeData", "true".to_string())], None)
            .await?;
        decode(body, "execution")
    }

    /// Delete an execution
    pub async fn delete_execution(&self, id: &str) -> Result<Value, N8nApiError> {
        let url = self.api_url(&["executions", id])?;
        self.send(Method::DELETE, url, &[], None).await
    }

    // ---- tags ----

    /// List all tags
    pub async fn list_tags(&self) -> Result<Vec<Tag>, N8nApiError> {
        let url = self.api_url(&["tags"])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode_list(body, "tags")
    }

    /// Get one tag by id
    pub async fn get_tag(&self, id: &str) -> Result<Tag, N8nApiError> {
        let url = self.api_url(&["tags", id])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode(body, "tag")
    }

    /// Create a tag
    pub async fn create_tag(&self, name: &str) -> Result<Tag, N8nApiError> {
        let url = self.api_url(&["tags"])?;
        let body = self.send(Method::POST, url, &[], Some(&json!({ "name": name }))).await?;
        decode(body, "tag")
    }

    /// Rename a tag
    pub async fn update_tag(&self, id: &str, name: &str) -> Result<Tag, N8nApiError> {
        let url = self.api_url(&["tags", id])?;
        let body = self.send(Method::PUT, url, &[], Some(&json!({ "name": name }))).await?;
        decode(body, "tag")
    }

    /// Delete a tag
    pub async fn delete_tag(&self, id: &str) -> Result<Value, N8nApiError> {
        let url = self.api_url(&["tags", id])?;
        self.send(Method::DELETE, url, &[], None).await
    }

    // ---- credentials & users ----

    /// List credential metadata
    pub async fn list_credentials(&self) -> Result<Vec<Credential>, N8nApiError> {
        let url = self.api_url(&["credentials"])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode_list(body, "credentials")
    }

    /// Get credential metadata by id
    pub async fn get_credential(&self, id: &str) -> Result<Credential, N8nApiError> {
        let url = self.api_url(&["credentials", id])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode(body, "credential")
    }

    /// List instance users
    pub async fn list_users(&self) -> Result<Vec<User>, N8nApiError> {
        let url = self.api_url(&["users"])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode_list(body, "users")
    }

    /// Get the user owning the API key
    pub async fn get_current_user(&self) -> Result<User, N8nApiError> {
        let url = self.api_url(&["users", "me"])?;
        let body = self.send(Method::GET, url, &[], None).await?;
        decode(body, "user")
    }

    // ---- webhooks ----

    /// Trigger a workflow through its webhook path on the instance root.
    ///
    /// Sends basic auth when webhook credentials are configured. A non-JSON response
    /// body is returned as a string.
    pub async fn run_webhook(
        &self,
        path: &str,
        data: Option<&Value>,
        headers: &[(String, String)],
    ) -> Result<Value, N8nApiError> {
        let mut url = parse_base(self.config.instance_base())?;
        append_segments(&mut url, &["webhook"])?;
        append_segments(&mut url, &path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>())?;

        let mut request = self
            .http
            .post(url.clone())
            .json(&data.cloned().unwrap_or_else(|| json!({})));
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some((username, password)) = self.config.webhook_credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let text = self.dispatch(Method::POST, &url, request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    // ---- plumbing ----

    fn api_url(&self, segments: &[&str]) -> Result<Url, N8nApiError> {
        let mut url = parse_base(self.config.api_base())?;
        append_segments(&mut url, segments)?;
        Ok(url)
    }

    /// Send an authenticated API request and decode its JSON body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, N8nApiError> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let text = self.dispatch(method.clone(), &url, request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| N8nApiError::decode(format!("{} {}", method, url.path()), e))
    }

    /// Execute a prepared request and return the raw body of a 2xx response
    async fn dispatch(
        &self,
        method: Method,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<String, N8nApiError> {
        let span = crate::upstream_span!(method, url.path());
        let debug_mode = self.config.debug;

        async move {
            let response = request.send().await.map_err(|e| {
                let error = N8nApiError::from_reqwest(e);
                if error.is_timeout() {
                    warn!(method = %method, url = %url, "n8n request timed out");
                } else {
                    warn!(method = %method, url = %url, error = %error, "n8n request failed");
                }
                error
            })?;

            let status = response.status();
            if debug_mode {
                info!(method = %method, url = %url, status = status.as_u16(), "n8n request");
            } else {
                debug!(method = %method, url = %url, status = status.as_u16(), "n8n request");
            }

            let text = response.text().await.map_err(N8nApiError::from_reqwest)?;
            if !status.is_success() {
                return Err(N8nApiError::from_status(status.as_u16(), &text));
            }
            Ok(text)
        }
        .instrument(span)
        .await
    }
}

fn parse_base(base: &str) -> Result<Url, N8nApiError> {
    Url::parse(base)
        .map_err(|e| N8nApiError::invalid_request(format!("Invalid n8n URL '{}': {}", base, e)))
}

fn append_segments(url: &mut Url, segments: &[&str]) -> Result<(), N8nApiError> {
    let display = url.to_string();
    let mut path = url
        .path_segments_mut()
        .map_err(|_| N8nApiError::invalid_request(format!("n8n URL cannot be a base: {}", display)))?;
    path.pop_if_empty().extend(segments);
    Ok(())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, N8nApiError> {
    serde_json::to_value(value).map_err(|e| N8nApiError::decode("request body", e))
}

fn decode<T: DeserializeOwned>(body: Value, context: &str) -> Result<T, N8nApiError> {
    serde_json::from_value(body).map_err(|e| N8nApiError::decode(context, e))
}

/// Decode a body that some n8n versions leave empty
fn decode_or_default<T: DeserializeOwned + Default>(body: Value, context: &str) -> Result<T, N8nApiError> {
    if body.is_null() {
        return Ok(T::default());
    }
    decode(body, context)
}

/// Decode a list response: a `data` envelope, a bare array, or nothing.
fn decode_list<T: DeserializeOwned>(body: Value, context: &str) -> Result<Vec<T>, N8nApiError> {
    let items = extract_list(body);
    items.into_iter().map(|item| decode(item, context)).collect()
}

/// Unwrap the `data` array of a list envelope; anything that is not a list yields empty
pub fn extract_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// The fields n8n accepts on `PUT /workflows/{id}`; read-only fields are rejected upstream.
fn writable_workflow(workflow: &Workflow) -> Value {
    json!({
        "name": workflow.name,
        "nodes": workflow.nodes,
        "connections": workflow.connections,
        "settings": workflow.settings,
        "staticData": workflow.extra.get("staticData").cloned().unwrap_or(Value::Null),
        "active": workflow.active,
        "tags": workflow.tags,
    })
}
