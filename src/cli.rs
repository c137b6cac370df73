//! # Command Line Interface
//!
//! Flags override the matching environment variables. Without a subcommand the MCP
//! server is started on stdio.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::{N8nConfig, ObservabilityConfig};
use crate::errors::Error;
use crate::mcp::{McpHandler, McpStdioServer, ToolRegistry};
use crate::n8n::N8nClient;
use crate::observability::{init_logging, log_config_info};

#[derive(Parser, Debug)]
#[command(name = "n8n-mcp")]
#[command(about = "MCP server exposing the n8n REST API as tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// n8n API base URL including /api/v1 (overrides N8N_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// n8n API key (overrides N8N_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Log every upstream request (overrides DEBUG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log filter directive (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdio (default)
    Serve,

    /// Probe the n8n API and exit
    Check,

    /// Print the tool definitions as JSON and exit
    Tools,
}

impl Cli {
    /// Environment lookup with command-line overrides applied
    pub fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            "N8N_API_URL" => self.api_url.clone(),
            "N8N_API_KEY" => self.api_key.clone(),
            "DEBUG" if self.debug => Some("true".to_string()),
            "RUST_LOG" => self.log_level.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }
}

/// Run the parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let observability = ObservabilityConfig::from_lookup(|key| cli.lookup(key));
    init_logging(&observability)?;

    let command = cli.command.clone().unwrap_or(Commands::Serve);
    if command == Commands::Tools {
        let registry = ToolRegistry::with_n8n_tools()?;
        println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
        return Ok(());
    }

    info!(app_name = crate::APP_NAME, version = crate::VERSION, "Starting n8n MCP server");

    let config = N8nConfig::from_lookup(|key| cli.lookup(key))?;
    log_config_info(&config);

    let client = N8nClient::new(config).map_err(|e| Error::transport(e.to_string()))?;
    probe(&client).await?;

    if command == Commands::Check {
        info!("n8n API reachable");
        return Ok(());
    }

    let registry = Arc::new(ToolRegistry::with_n8n_tools()?);
    let server = McpStdioServer::new(McpHandler::new(registry, client));
    server.run().await
}

/// Startup connectivity probe; failure aborts startup
async fn probe(client: &N8nClient) -> Result<(), Error> {
    client.check_connectivity().await.map_err(|e| {
        error!(
            api_url = %client.config().api_url,
            status = ?e.status(),
            error = %e,
            "n8n connectivity check failed"
        );
        Error::transport(format!("Cannot reach n8n at {}: {}", client.config().api_url, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::parse_from([
            "n8n-mcp",
            "--api-url",
            "http://n8n.local/api/v1",
            "--api-key",
            "from-flag",
            "--debug",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.lookup("N8N_API_URL").as_deref(), Some("http://n8n.local/api/v1"));
        assert_eq!(cli.lookup("N8N_API_KEY").as_deref(), Some("from-flag"));
        assert_eq!(cli.lookup("DEBUG").as_deref(), Some("true"));
        assert_eq!(cli.lookup("RUST_LOG").as_deref(), Some("debug"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::parse_from(["n8n-mcp", "check", "--api-key", "k"]);
        assert_eq!(cli.command, Some(Commands::Check));
        assert_eq!(cli.api_key.as_deref(), Some("k"));

        let cli = Cli::parse_from(["n8n-mcp", "tools"]);
        assert_eq!(cli.command, Some(Commands::Tools));
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal_error() {
        let client =
            N8nClient::new(N8nConfig::new("http://127.0.0.1:1/api/v1", "key")).expect("client");
        let error = probe(&client).await.expect_err("unreachable host");
        assert!(matches!(error, Error::Transport(_)));
        assert!(error.to_string().contains("127.0.0.1:1"));
    }
}
