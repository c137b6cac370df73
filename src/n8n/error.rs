//! n8n API Error Normalization
//!
//! Every failure of an upstream call (transport, non-2xx status, undecodable body) is
//! reported as one [`N8nApiError`]. The underlying cause is kept as the error source and
//! never escapes on its own.

use serde_json::Value;
use thiserror::Error;

/// Classification of an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum N8nErrorKind {
    /// The upstream answered with a non-2xx status
    Api,
    /// Connection-level failure; no HTTP status is available
    Transport,
    /// The request exceeded its timeout
    Timeout,
    /// A response body could not be decoded
    Decode,
}

/// Normalized error for all traffic to the n8n REST API
#[derive(Debug, Error)]
#[error("{message}")]
pub struct N8nApiError {
    kind: N8nErrorKind,
    status: Option<u16>,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl N8nApiError {
    /// Build an error from a non-2xx response.
    ///
    /// The upstream `message` field is used when the body carries one; otherwise a
    /// description of the status code is used.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = upstream_message(body).unwrap_or_else(|| describe_status(status).to_string());
        Self {
            kind: N8nErrorKind::Api,
            status: Some(status),
            message: format!("n8n API error ({}): {}", status, detail),
            source: None,
        }
    }

    /// Build an error from a reqwest failure
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        let (kind, message) = if error.is_timeout() {
            (N8nErrorKind::Timeout, format!("n8n request timed out: {}", error))
        } else if error.is_decode() {
            (N8nErrorKind::Decode, format!("Failed to read n8n response: {}", error))
        } else {
            (N8nErrorKind::Transport, format!("Failed to reach n8n: {}", error))
        };

        Self { kind, status: error.status().map(|s| s.as_u16()), message, source: Some(Box::new(error)) }
    }

    /// Build an error for a body that is not the expected JSON shape
    pub fn decode(context: impl Into<String>, error: serde_json::Error) -> Self {
        Self {
            kind: N8nErrorKind::Decode,
            status: None,
            message: format!("Failed to decode n8n response: {}: {}", context.into(), error),
            source: Some(Box::new(error)),
        }
    }

    /// Build an error for a request that could not be constructed
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { kind: N8nErrorKind::Transport, status: None, message: message.into(), source: None }
    }

    /// Failure classification
    pub fn kind(&self) -> N8nErrorKind {
        self.kind
    }

    /// HTTP status, when the upstream produced one
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the request timed out
    pub fn is_timeout(&self) -> bool {
        self.kind == N8nErrorKind::Timeout
    }
}

/// Extract the `message` field n8n puts into its error bodies
fn upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(|m| m.to_string()),
        Err(_) => Some(trimmed.chars().take(500).collect()),
    }
}

fn describe_status(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized: check the N8N_API_KEY",
        403 => "Forbidden",
        404 => "Resource not found",
        405 => "Method not allowed",
        409 => "Conflict",
        429 => "Too many requests",
        500..=599 => "n8n server error",
        _ => "Unexpected response",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_upstream_message() {
        let error = N8nApiError::from_status(404, r#"{"message":"Workflow not found"}"#);
        assert_eq!(error.kind(), N8nErrorKind::Api);
        assert_eq!(error.status(), Some(404));
        assert_eq!(error.to_string(), "n8n API error (404): Workflow not found");
    }

    #[test]
    fn test_from_status_without_body() {
        let error = N8nApiError::from_status(401, "");
        assert_eq!(error.message(), "n8n API error (401): Unauthorized: check the N8N_API_KEY");

        let error = N8nApiError::from_status(503, "{}");
        assert_eq!(error.message(), "n8n API error (503): n8n server error");
    }

    #[test]
    fn test_from_status_with_plain_text_body() {
        let error = N8nApiError::from_status(400, "request/body must have required property 'name'");
        assert!(error.message().contains("must have required property 'name'"));
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let json_error = serde_json::from_str::<Value>("{not json").unwrap_err();
        let error = N8nApiError::decode("GET /workflows", json_error);

        assert_eq!(error.kind(), N8nErrorKind::Decode);
        assert!(error.status().is_none());
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.message().contains("GET /workflows"));
    }
}
