//! SQLite-backed page store for the crawled documentation generation.
//!
//! This module provides durable, path-keyed storage of pages plus the
//! crawl metadata that marks a generation as complete. It supports:
//!
//! - One atomic row per page (upsert by path)
//! - A single metadata row whose presence means "a generation exists"
//! - TTL-based staleness evaluation
//! - Whole-generation replacement in one transaction

pub mod connection;
pub mod metadata;
pub mod migrations;
pub mod pages;

pub use crate::Error;

pub use connection::PageStore;
pub use metadata::{CacheMetadata, PageMeta};
pub use pages::Page;
