//! # n8n MCP
//!
//! Model Context Protocol server exposing the n8n workflow automation REST API to an
//! external agent as named tools and read-only resources.
//!
//! ## Architecture
//!
//! ```text
//! stdin → McpStdioServer → McpHandler → ToolRegistry → tool handler → N8nClient → n8n
//!                                    ↘ resources ────────────────────↗
//! ```
//!
//! Every tool call terminates in a result envelope; upstream failures are normalized
//! into [`n8n::N8nApiError`] and reported with `isError: true`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use n8n_mcp::{config::N8nConfig, mcp::{McpHandler, McpStdioServer, ToolRegistry}, n8n::N8nClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = N8nClient::new(N8nConfig::from_env()?)?;
//!     client.check_connectivity().await?;
//!     let registry = Arc::new(ToolRegistry::with_n8n_tools()?);
//!     McpStdioServer::new(McpHandler::new(registry, client)).run().await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod mcp;
pub mod n8n;
pub mod observability;

pub use config::{N8nConfig, ObservabilityConfig};
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
