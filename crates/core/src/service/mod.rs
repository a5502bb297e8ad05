//! Documentation service façade.
//!
//! [`DocsService`] ties the page store, the search index, the readiness gate
//! and the sync coordinator together behind one cheaply clonable handle.
//! Reads are refused until a generation has been loaded from disk or synced;
//! once ready, reads always see one complete generation.

pub mod readiness;
pub mod registry;
pub mod sections;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::Error;
use crate::cache::{Page, PageStore};
use crate::config::{AppConfig, DEFAULT_CRAWL_CONCURRENCY, DEFAULT_DOCS_BASE_URL, DEFAULT_TTL_DAYS};
use crate::crawl::Crawler;
use crate::search::{SearchIndex, SearchResult};
pub use readiness::ReadinessGate;
pub use registry::DocsRegistry;
pub use sections::{PageSummary, SectionNode, build_section_tree};
pub use sync::{SyncCoordinator, SyncSettings, SyncState, SyncStatus};

/// Construction options for a [`DocsService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsServiceOptions {
    pub cache_dir: PathBuf,
    pub ttl_days: u32,
    pub docs_base_url: String,
    pub crawl_concurrency: usize,
}

impl DocsServiceOptions {
    /// Options with defaults for everything but the cache root.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl_days: DEFAULT_TTL_DAYS,
            docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
            crawl_concurrency: DEFAULT_CRAWL_CONCURRENCY,
        }
    }
}

impl From<&AppConfig> for DocsServiceOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            ttl_days: config.ttl_days,
            docs_base_url: config.docs_base_url.clone(),
            crawl_concurrency: config.crawl_concurrency,
        }
    }
}

struct Inner {
    store: PageStore,
    index: Arc<ArcSwap<SearchIndex>>,
    gate: Arc<ReadinessGate>,
    sync: Arc<SyncCoordinator>,
    options: DocsServiceOptions,
}

/// Handle on one cached documentation mirror.
#[derive(Clone)]
pub struct DocsService {
    inner: Arc<Inner>,
}

impl DocsService {
    /// Open (creating if needed) the store under `options.cache_dir`.
    ///
    /// Does not load or crawl anything; call [`DocsService::ensure_ready`].
    pub async fn open(options: DocsServiceOptions, crawler: Arc<dyn Crawler>) -> Result<Self, Error> {
        let store = PageStore::open(&options.cache_dir).await?;
        Ok(Self::with_store(store, options, crawler))
    }

    /// Build a service over an already-open store.
    pub fn with_store(store: PageStore, options: DocsServiceOptions, crawler: Arc<dyn Crawler>) -> Self {
        let index = Arc::new(ArcSwap::from_pointee(SearchIndex::new()));
        let gate = Arc::new(ReadinessGate::new());
        let settings = SyncSettings {
            base_url: options.docs_base_url.trim_end_matches('/').to_string(),
            ttl_days: options.ttl_days,
            concurrency: options.crawl_concurrency,
        };
        let sync = Arc::new(SyncCoordinator::new(
            store.clone(),
            crawler,
            Arc::clone(&index),
            Arc::clone(&gate),
            settings,
        ));
        Self { inner: Arc::new(Inner { store, index, gate, sync, options }) }
    }

    pub fn options(&self) -> &DocsServiceOptions {
        &self.inner.options
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.options.cache_dir
    }

    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_ready()
    }

    /// Make the service ready to answer reads.
    ///
    /// With a stored generation this loads it and returns immediately,
    /// starting a background refresh if it is stale. Without one it crawls
    /// synchronously first.
    ///
    /// # Errors
    ///
    /// `SyncFailed` if there was no cache and the first crawl failed; storage
    /// errors while loading.
    pub async fn ensure_ready(&self) -> Result<(), Error> {
        let inner = &self.inner;
        if inner.gate.is_ready() {
            return Ok(());
        }

        let _init = inner.gate.initializing().await;
        if inner.gate.is_ready() {
            return Ok(());
        }

        // A sync started through `sync()` before anyone asked for readiness
        // commits a generation on its own.
        if let Some(running) = inner.sync.in_flight() {
            if let Err(error) = running.await {
                tracing::debug!(%error, "joined sync failed, checking the store");
            }
            if inner.gate.is_ready() {
                return Ok(());
            }
        }

        if !inner.store.exists().await? {
            tracing::info!(cache_dir = %self.cache_dir().display(), "no cached docs, running initial sync");
            inner.sync.start_or_join().await.map_err(Error::SyncFailed)?;
            return Ok(());
        }

        let pages = inner.store.load_all_pages().await?;
        tracing::info!(pages = pages.len(), "loaded cached docs");
        inner.index.store(Arc::new(SearchIndex::from_pages(pages)?));
        inner.gate.mark_ready();

        if inner.sync.needs_sync(false).await? {
            tracing::info!("cached docs are stale, refreshing in background");
            inner.sync.sync_in_background();
        }
        Ok(())
    }

    /// Refresh the mirror if `force` or stale, joining any running sync.
    pub async fn sync(&self, force: bool) -> SyncStatus {
        self.inner.sync.sync(force).await
    }

    pub async fn status(&self) -> Result<SyncStatus, Error> {
        self.inner.sync.status().await
    }

    /// Whether the stored generation is missing or older than its TTL.
    pub async fn is_stale(&self) -> Result<bool, Error> {
        self.inner.store.is_stale().await
    }

    pub async fn needs_sync(&self, force: bool) -> Result<bool, Error> {
        self.inner.sync.needs_sync(force).await
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error> {
        self.inner.gate.check()?;
        self.inner.index.load().search(query, limit)
    }

    /// Exact lookup after path normalization (`guides/ci/` → `/guides/ci`).
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank path; the root page is `/`.
    pub fn get_page(&self, path: &str) -> Result<Option<Page>, Error> {
        self.inner.gate.check()?;
        if path.trim().is_empty() {
            return Err(Error::InvalidInput("page path must not be empty".to_string()));
        }
        let path = normalize_page_path(path);
        Ok(self.inner.index.load().get_page(&path).cloned())
    }

    pub fn list_pages(&self) -> Result<Vec<PageSummary>, Error> {
        self.inner.gate.check()?;
        Ok(self
            .inner
            .index
            .load()
            .get_all_pages()
            .into_iter()
            .map(|p| PageSummary { path: p.path, title: p.title, url: p.url })
            .collect())
    }

    pub fn list_sections(&self) -> Result<SectionNode, Error> {
        Ok(build_section_tree(&self.list_pages()?))
    }
}

/// Leading slash added, trailing slash dropped except for the root.
pub fn normalize_page_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}
