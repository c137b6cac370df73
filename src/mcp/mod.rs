//! MCP (Model Context Protocol) Server Implementation
//!
//! Stdio-based MCP server exposing the n8n REST API as tools and resources.

pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use handler::McpHandler;
pub use protocol::*;
pub use registry::{ToolHandler, ToolRegistry, ToolRegistryBuilder};
pub use resources::{list_resource_templates, list_resources, read_resource, ResourceUri};
pub use server::McpStdioServer;
