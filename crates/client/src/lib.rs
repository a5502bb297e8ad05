//! Client code for docmirror.
//!
//! This crate provides the HTTP fetch pipeline, sitemap parsing and page
//! extraction behind the core `Crawler` interface, shared by the server and
//! CLI.

pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod sitemap;

pub use crawler::{HttpCrawler, sitemap_url};
pub use extract::{ExtractedPage, extract_page, to_markdown};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, canonicalize, url_to_path};
pub use sitemap::parse_sitemap;
