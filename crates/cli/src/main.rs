//! docmirror command-line entry point.
//!
//! Drives the same documentation service as the MCP server and prints pretty
//! JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docmirror_client::{FetchConfig, HttpCrawler};
use docmirror_core::{AppConfig, DEFAULT_SEARCH_LIMIT, DocsService, DocsServiceOptions, Error, SyncState};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docmirror", version, about = "Offline mirror of a documentation site")]
struct Cli {
    /// Directory holding the page cache
    #[arg(long, env = "DOCMIRROR_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Days before the cache is considered stale
    #[arg(long, global = true)]
    ttl_days: Option<u32>,

    /// Base URL of the documentation site
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Refresh the cache if stale
    Sync {
        /// Re-crawl even if the cache is fresh
        #[arg(long)]
        force: bool,
    },
    /// Search cached pages
    Search {
        query: String,
        #[arg(long, short = 'n', default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Print one page by path
    Page { path: String },
    /// Print the section tree
    Sections,
    /// Print cache status without syncing
    Status,
}

impl Cli {
    /// Layer command-line overrides over the loaded configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(ttl) = self.ttl_days {
            config.ttl_days = ttl;
        }
        if let Some(url) = &self.base_url {
            config.docs_base_url = url.clone();
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, service: DocsService) -> Result<()> {
    match cli.command {
        Command::Sync { force } => {
            let status = service.sync(force).await;
            print_json(&status)?;
            if status.status == SyncState::Error {
                anyhow::bail!("sync failed: {}", status.error.unwrap_or_default());
            }
        }
        Command::Search { query, limit } => {
            service.ensure_ready().await?;
            print_json(&json!({ "results": service.search(&query, limit)? }))?;
        }
        Command::Page { path } => {
            service.ensure_ready().await?;
            let page = service.get_page(&path)?.ok_or_else(|| Error::NotFound(format!("page {path}")))?;
            print_json(&json!({
                "title": page.title,
                "url": page.url,
                "path": page.path,
                "content": page.content,
            }))?;
        }
        Command::Sections => {
            service.ensure_ready().await?;
            print_json(&json!({ "sections": service.list_sections()? }))?;
        }
        Command::Status => print_json(&service.status().await?)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let crawler = HttpCrawler::new(FetchConfig::from(&config))?;
    let service = DocsService::open(DocsServiceOptions::from(&config), Arc::new(crawler))
        .await
        .with_context(|| format!("failed to open cache at {}", config.cache_dir.display()))?;

    run(cli, service).await
}
