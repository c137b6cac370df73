//! # Structured Logging
//!
//! Logging setup and span helpers built on the tracing ecosystem.
//!
//! All log output goes to stderr: stdout carries the MCP JSON-RPC stream and must never
//! receive anything but protocol messages.

use crate::config::{N8nConfig, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};
use validator::Validate;

/// Create a tracing span for one upstream n8n request.
///
/// ```rust,ignore
/// let span = upstream_span!("GET", "/workflows");
/// ```
#[macro_export]
macro_rules! upstream_span {
    ($method:expr, $path:expr) => {
        tracing::debug_span!(
            "n8n_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "n8n_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for one MCP tool invocation.
#[macro_export]
macro_rules! tool_span {
    ($tool:expr) => {
        tracing::info_span!(
            "mcp_tool_call",
            tool = %$tool,
            call_id = %uuid::Uuid::new_v4()
        )
    };
}

/// Install the global tracing subscriber.
///
/// Returns an error when the filter directive cannot be parsed. An already-installed
/// global subscriber (e.g. inside tests) is left untouched.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    Validate::validate(config).map_err(Error::from)?;

    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    // A subscriber installed earlier (integration tests) stays in place.
    let _ = if config.json_logging {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).with_ansi(false).try_init()
    };

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &N8nConfig) {
    tracing::info!(
        api_url = %config.api_url,
        timeout_seconds = config.timeout_seconds,
        debug = config.debug,
        webhook_auth = config.webhook_credentials().is_some(),
        "n8n MCP server configuration"
    );
}
