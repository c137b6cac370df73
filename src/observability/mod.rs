//! # Observability Infrastructure
//!
//! Structured logging for the n8n MCP server.

pub mod logging;

pub use logging::{init_logging, log_config_info};
