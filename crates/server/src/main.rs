//! docs-mcp server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use docmirror_client::{FetchConfig, HttpCrawler};
use docmirror_core::{AppConfig, DocsService, DocsServiceOptions};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        base_url = %config.docs_base_url,
        ttl_days = config.ttl_days,
        "Starting docs-mcp server on stdio transport"
    );

    let crawler = HttpCrawler::new(FetchConfig::from(&config))?;
    let service = DocsService::open(DocsServiceOptions::from(&config), Arc::new(crawler)).await?;

    let handler = handler::DocsServer::new(service);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
