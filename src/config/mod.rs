//! # Configuration Management
//!
//! Environment-driven configuration for the n8n MCP server. Values are read once at
//! startup and validated; a missing or malformed required value aborts startup.

pub mod settings;

pub use settings::{N8nConfig, ObservabilityConfig, DEFAULT_TIMEOUT_SECONDS};
