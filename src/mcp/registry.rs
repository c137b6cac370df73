//! MCP Tool Registry & Dispatcher
//!
//! Immutable mapping from tool name to handler, assembled once at startup. Every call
//! through [`ToolRegistry::call_tool`] terminates in a [`ToolCallResult`]; handler errors
//! and panics become error envelopes.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use jsonschema::{Draft, Validator};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, Instrument};

use crate::mcp::error::McpError;
use crate::mcp::protocol::{Tool, ToolCallResult};
use crate::mcp::tools;
use crate::n8n::N8nClient;

/// One tool implementation
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Static definition announced through `tools/list`
    fn definition(&self) -> Tool;

    /// Run the tool with arguments already validated against the definition's schema
    async fn execute(
        &self,
        client: &N8nClient,
        arguments: Value,
    ) -> Result<ToolCallResult, McpError>;
}

struct RegisteredTool {
    definition: Tool,
    validator: Validator,
    handler: Box<dyn ToolHandler>,
}

/// Collects handlers before the registry is frozen
#[derive(Default)]
pub struct ToolRegistryBuilder {
    handlers: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistryBuilder {
    /// Add one handler
    pub fn register(mut self, handler: Box<dyn ToolHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Add a group of handlers
    pub fn register_all(mut self, handlers: Vec<Box<dyn ToolHandler>>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    /// Compile every input schema and freeze the registry.
    ///
    /// Fails on duplicate tool names or schemas that do not compile.
    pub fn build(self) -> Result<ToolRegistry, McpError> {
        let mut tools = Vec::with_capacity(self.handlers.len());
        let mut index = HashMap::with_capacity(self.handlers.len());

        for handler in self.handlers {
            let definition = handler.definition();
            if index.contains_key(&definition.name) {
                return Err(McpError::InternalError(format!(
                    "Duplicate tool name: {}",
                    definition.name
                )));
            }

            let validator = Validator::options()
                .with_draft(Draft::Draft7)
                .build(&definition.input_schema)
                .map_err(|e| {
                    McpError::InternalError(format!(
                        "Invalid input schema for tool '{}': {}",
                        definition.name, e
                    ))
                })?;

            index.insert(definition.name.clone(), tools.len());
            tools.push(RegisteredTool { definition, validator, handler });
        }

        Ok(ToolRegistry { tools, index })
    }
}

/// Immutable tool registry shared by all requests
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| &t.definition.name).collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registry holding every n8n tool group
    pub fn with_n8n_tools() -> Result<Self, McpError> {
        Self::builder()
            .register_all(tools::workflows::handlers())
            .register_all(tools::executions::handlers())
            .register_all(tools::tags::handlers())
            .register_all(tools::credentials::handlers())
            .register_all(tools::users::handlers())
            .register_all(tools::webhooks::handlers())
            .build()
    }

    /// All tool definitions in registration order
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a tool call.
    ///
    /// Never fails: unknown tools, invalid arguments, upstream errors and handler panics
    /// all produce an error envelope.
    pub async fn call_tool(
        &self,
        client: &N8nClient,
        name: &str,
        arguments: Option<Value>,
    ) -> ToolCallResult {
        let Some(entry) = self.index.get(name).map(|&i| &self.tools[i]) else {
            error!(tool = %name, "Unknown tool requested");
            return ToolCallResult::error(McpError::ToolNotFound(name.to_string()).to_string());
        };

        let span = crate::tool_span!(name);
        async move {
            let outcome = match validate_arguments(&entry.validator, arguments) {
                Ok(arguments) => {
                    debug!("Arguments validated");
                    AssertUnwindSafe(entry.handler.execute(client, arguments))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(McpError::InternalError(format!(
                                "Tool panicked: {}",
                                panic_message(panic.as_ref())
                            )))
                        })
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!(tool = %name, error = %e, "Tool call failed");
                    ToolCallResult::error(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Normalize and schema-check tool arguments; a missing argument object counts as `{}`
fn validate_arguments(validator: &Validator, arguments: Option<Value>) -> Result<Value, McpError> {
    let arguments = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value @ Value::Object(_)) => value,
        Some(_) => {
            return Err(McpError::InvalidParams("arguments must be a JSON object".to_string()))
        }
    };

    let errors: Vec<String> = validator
        .iter_errors(&arguments)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", path, e)
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(arguments)
    } else {
        Err(McpError::InvalidParams(errors.join("; ")))
    }
}

/// Deserialize validated arguments into a typed struct
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
