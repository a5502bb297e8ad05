//! Crawl collaborator interface.
//!
//! The sync coordinator only needs two things from the outside world: the
//! list of pages the upstream site advertises, and the extracted content of
//! one page. [`crawl_many`] fans individual crawls out with a fixed
//! concurrency limit and drops failures.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::Error;
use crate::cache::Page;

/// One `<url>` entry of the upstream sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self { loc: loc.into(), lastmod: None }
    }
}

/// A successfully crawled page plus the sitemap's lastmod for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub page: Page,
    pub lastmod: Option<String>,
}

/// Source of documentation pages.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Fetch the list of pages advertised under `base_url`.
    ///
    /// Fails when the listing itself is unreachable or not a 2xx response.
    async fn fetch_page_list(&self, base_url: &str) -> Result<Vec<SitemapEntry>, Error>;

    /// Fetch and extract a single page.
    async fn crawl_page(&self, url: &str) -> Result<Page, Error>;
}

/// Crawl `entries` with at most `limit` requests in flight.
///
/// Results keep sitemap order. Failed entries are logged and omitted.
pub async fn crawl_many(crawler: &dyn Crawler, entries: &[SitemapEntry], limit: usize) -> Vec<CrawlResult> {
    stream::iter(entries.iter().cloned())
        .map(|entry| async move {
            match crawler.crawl_page(&entry.loc).await {
                Ok(page) => Some(CrawlResult { page, lastmod: entry.lastmod }),
                Err(e) => {
                    tracing::warn!(url = %entry.loc, error = %e, "failed to crawl page");
                    None
                }
            }
        })
        .buffered(limit.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await
}

#[cfg(any(test, feature = "test-util"))]
pub use testing::StaticCrawler;

#[cfg(any(test, feature = "test-util"))]
mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::{Crawler, SitemapEntry};
    use crate::Error;
    use crate::cache::Page;

    /// Deterministic in-memory crawler for tests.
    ///
    /// Serves a fixed page set, can fail chosen URLs or the whole listing,
    /// and can hold the listing until a gate is opened.
    #[derive(Default)]
    pub struct StaticCrawler {
        pages: Vec<Page>,
        failing: HashSet<String>,
        unreachable: bool,
        delay: Option<Duration>,
        gate: Option<Arc<Notify>>,
        list_calls: Arc<AtomicUsize>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StaticCrawler {
        pub fn new(pages: Vec<Page>) -> Self {
            Self { pages, ..Default::default() }
        }

        /// Make `crawl_page` fail for `url`.
        pub fn failing(mut self, url: impl Into<String>) -> Self {
            self.failing.insert(url.into());
            self
        }

        /// Make `fetch_page_list` fail.
        pub fn unreachable(mut self) -> Self {
            self.unreachable = true;
            self
        }

        /// Sleep this long inside every call.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Block `fetch_page_list` until `gate` is notified.
        pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        /// Shared counter of `fetch_page_list` calls.
        pub fn list_calls(&self) -> Arc<AtomicUsize> {
            self.list_calls.clone()
        }

        /// Highest number of concurrent `crawl_page` calls observed.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Crawler for StaticCrawler {
        async fn fetch_page_list(&self, base_url: &str) -> Result<Vec<SitemapEntry>, Error> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.unreachable {
                return Err(Error::UpstreamUnavailable(format!("{base_url}/sitemap.xml: status 503")));
            }
            Ok(self.pages.iter().map(|p| SitemapEntry::new(p.url.clone())).collect())
        }

        async fn crawl_page(&self, url: &str) -> Result<Page, Error> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(url) {
                return Err(Error::PageFetchFailed { url: url.to_string(), reason: "status 500".into() });
            }
            let by_url: HashMap<&str, &Page> = self.pages.iter().map(|p| (p.url.as_str(), p)).collect();
            by_url
                .get(url)
                .map(|p| (*p).clone())
                .ok_or_else(|| Error::PageFetchFailed { url: url.to_string(), reason: "status 404".into() })
        }
    }
}
