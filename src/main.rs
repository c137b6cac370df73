use clap::Parser;
use n8n_mcp::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    cli::run(Cli::parse()).await
}
