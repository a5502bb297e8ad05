//! Core types and shared functionality for docmirror.
//!
//! This crate provides:
//! - SQLite-backed page store with TTL staleness
//! - In-memory full-text search index
//! - Single-flight sync coordination and the `DocsService` façade
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod crawl;
pub mod error;
pub mod search;
pub mod service;

pub use cache::{CacheMetadata, Page, PageMeta, PageStore};
pub use config::AppConfig;
pub use crawl::{CrawlResult, Crawler, SitemapEntry, crawl_many};
pub use error::Error;
pub use search::{DEFAULT_SEARCH_LIMIT, SearchIndex, SearchResult};
pub use service::{
    DocsRegistry, DocsService, DocsServiceOptions, PageSummary, SectionNode, SyncState, SyncStatus, build_section_tree,
};
