//! # Error Handling
//!
//! Startup and process-level errors for the n8n MCP server. Per-call failures never
//! surface through this type: they are turned into error envelopes by the tool registry.

/// Custom result type for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the n8n MCP server
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream connectivity errors raised while starting up
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let details: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, details.join(", "))
            })
            .collect();
        messages.sort();

        Self::Config(format!("Validation failed: {}", messages.join("; ")))
    }
}
