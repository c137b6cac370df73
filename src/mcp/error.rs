//! MCP Error Types

use crate::mcp::protocol::{error_codes, JsonRpcError};
use crate::n8n::N8nApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A lookup inside a tool found nothing (e.g. a workflow name)
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] N8nApiError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => {
                error_codes::METHOD_NOT_FOUND
            }
            McpError::ResourceNotFound(_) => error_codes::RESOURCE_NOT_FOUND,
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            McpError::InternalError(_)
            | McpError::NotFound(_)
            | McpError::Upstream(_)
            | McpError::SerializationError(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert to JsonRpcError
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        JsonRpcError { code: self.error_code(), message: self.to_string(), data: None }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(error: McpError) -> Self {
        error.to_json_rpc_error()
    }
}
