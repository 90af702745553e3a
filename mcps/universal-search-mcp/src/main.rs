//! Universal Search MCP Server
//!
//! Cross-provider search (Google Books, YouTube, Wikipedia) with entity merging.
//!
//! # Configuration
//! Set `GOOGLE_API_KEY` / `YOUTUBE_API_KEY`, or configure in `~/.binks/universal-search.toml`

use rmcp::{transport::stdio, ServiceExt};

use universal_search_mcp::{Config, UniversalSearchMcpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mcp_common::init_tracing("universal_search_mcp")?;

    tracing::info!("Starting Universal Search MCP Server");

    let config = Config::load()?;
    tracing::info!(
        "Timeout: {}s, max results per provider: {}",
        config.search.timeout_seconds,
        config.search.max_results
    );

    let server = UniversalSearchMcpServer::new(config)?;
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
