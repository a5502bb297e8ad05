//! Refresh orchestration.
//!
//! At most one crawl runs at a time. A caller that asks for a sync while one
//! is in flight awaits the running one instead of starting another. A
//! generation becomes visible only after its pages and metadata have been
//! committed together, and the search index is swapped in one step.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{SecondsFormat, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::readiness::ReadinessGate;
use crate::Error;
use crate::cache::{CacheMetadata, PageMeta, PageStore};
use crate::crawl::{Crawler, crawl_many};
use crate::search::SearchIndex;

/// Result of one crawl run: page count, or the rendered failure.
pub type SyncOutcome = Result<usize, String>;

/// Handle on a running sync, cloneable by every waiter.
pub type SharedSync = Shared<BoxFuture<'static, SyncOutcome>>;

/// Externally reported sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    UpToDate,
    Syncing,
    Synced,
    Error,
}

/// Snapshot of the cache as seen by callers of `sync` and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SyncStatus {
    pub status: SyncState,
    pub total_pages: usize,
    /// RFC3339 instant of the last completed crawl.
    pub last_sync: Option<String>,
    /// RFC3339 instant at which the current generation turns stale.
    pub next_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Settings the coordinator needs for a crawl.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub base_url: String,
    pub ttl_days: u32,
    pub concurrency: usize,
}

/// Decides when to refresh and runs refreshes one at a time.
pub struct SyncCoordinator {
    store: PageStore,
    crawler: Arc<dyn Crawler>,
    index: Arc<ArcSwap<SearchIndex>>,
    gate: Arc<ReadinessGate>,
    settings: SyncSettings,
    inflight: Mutex<Option<SharedSync>>,
    last_error: Mutex<Option<String>>,
}

/// Empties the in-flight slot when the sync task ends, even on panic.
struct InflightGuard(Arc<SyncCoordinator>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.inflight.lock().take();
    }
}

impl SyncCoordinator {
    pub fn new(
        store: PageStore, crawler: Arc<dyn Crawler>, index: Arc<ArcSwap<SearchIndex>>, gate: Arc<ReadinessGate>,
        settings: SyncSettings,
    ) -> Self {
        Self { store, crawler, index, gate, settings, inflight: Mutex::new(None), last_error: Mutex::new(None) }
    }

    /// True if forced, if no generation exists, or if it is stale.
    ///
    /// Undecodable metadata also counts: a fresh crawl replaces it.
    pub async fn needs_sync(&self, force: bool) -> Result<bool, Error> {
        if force || !self.store.exists().await? {
            return Ok(true);
        }
        match self.store.is_stale().await {
            Ok(stale) => Ok(stale),
            Err(Error::CorruptData(reason)) => {
                tracing::warn!(%reason, "cache metadata unreadable, scheduling re-crawl");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.inflight.lock().is_some()
    }

    /// Handle on the running sync, if any.
    pub fn in_flight(&self) -> Option<SharedSync> {
        self.inflight.lock().clone()
    }

    /// Join the running sync or start a new one.
    ///
    /// The crawl runs on its own task, so it completes even if every caller
    /// stops waiting.
    pub fn start_or_join(self: &Arc<Self>) -> SharedSync {
        let mut slot = self.inflight.lock();
        if let Some(running) = slot.as_ref() {
            tracing::debug!("sync already in flight, joining");
            return running.clone();
        }

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _guard = InflightGuard(Arc::clone(&this));
            this.run().await
        });

        let shared = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(format!("sync task aborted: {e}")),
            }
        }
        .boxed()
        .shared();

        *slot = Some(shared.clone());
        shared
    }

    /// Start a sync without waiting for it. Failures are only logged.
    pub fn sync_in_background(self: &Arc<Self>) {
        let running = self.start_or_join();
        tokio::spawn(async move {
            if let Err(error) = running.await {
                tracing::warn!(%error, "background refresh failed, serving previous generation");
            }
        });
    }

    /// Refresh if needed and report the resulting status.
    ///
    /// Never fails: errors are reported as [`SyncState::Error`] and leave the
    /// previous generation in place.
    pub async fn sync(self: &Arc<Self>, force: bool) -> SyncStatus {
        match self.needs_sync(force).await {
            Ok(false) => return self.status().await.unwrap_or_else(|e| self.failed_status(e.to_string())),
            Ok(true) => {}
            Err(e) => return self.failed_status(e.to_string()),
        }

        match self.start_or_join().await {
            Ok(_) => match self.status().await {
                Ok(mut status) => {
                    status.status = SyncState::Synced;
                    status
                }
                Err(e) => self.failed_status(e.to_string()),
            },
            Err(message) => {
                let mut status = self.status().await.unwrap_or_else(|_| self.failed_status(String::new()));
                status.status = SyncState::Error;
                status.error = Some(message);
                status
            }
        }
    }

    /// Failure message of the most recent sync, cleared by a successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Current status of the stored generation.
    ///
    /// While no sync runs, a failed last attempt reports [`SyncState::Error`]
    /// with its message alongside the generation still being served.
    pub async fn status(&self) -> Result<SyncStatus, Error> {
        let syncing = self.is_syncing();
        let last_error = if syncing { None } else { self.last_error() };

        if !self.store.exists().await? {
            return Ok(SyncStatus {
                status: if syncing { SyncState::Syncing } else { SyncState::Error },
                total_pages: 0,
                last_sync: None,
                next_check: None,
                error: (!syncing).then(|| last_error.unwrap_or_else(|| "cache not initialized".to_string())),
            });
        }

        let metadata = self.store.load_metadata().await?;
        let status = match (syncing, &last_error) {
            (true, _) => SyncState::Syncing,
            (false, Some(_)) => SyncState::Error,
            (false, None) => SyncState::UpToDate,
        };
        Ok(SyncStatus {
            status,
            total_pages: metadata.pages.len(),
            last_sync: Some(metadata.last_crawl.to_rfc3339_opts(SecondsFormat::Millis, true)),
            next_check: Some(metadata.next_check().to_rfc3339_opts(SecondsFormat::Millis, true)),
            error: last_error,
        })
    }

    fn failed_status(&self, message: String) -> SyncStatus {
        SyncStatus {
            status: SyncState::Error,
            total_pages: 0,
            last_sync: None,
            next_check: None,
            error: (!message.is_empty()).then_some(message),
        }
    }

    async fn run(&self) -> SyncOutcome {
        match self.crawl_and_commit().await {
            Ok(count) => {
                self.last_error.lock().take();
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "documentation sync failed");
                let message = e.to_string();
                *self.last_error.lock() = Some(message.clone());
                Err(message)
            }
        }
    }

    async fn crawl_and_commit(&self) -> Result<usize, Error> {
        let settings = &self.settings;
        tracing::info!(base_url = %settings.base_url, "crawling documentation");

        let entries = self
            .crawler
            .fetch_page_list(&settings.base_url)
            .await
            .map_err(|e| match e {
                Error::UpstreamUnavailable(_) => e,
                other => Error::UpstreamUnavailable(other.to_string()),
            })?;

        let results = crawl_many(self.crawler.as_ref(), &entries, settings.concurrency).await;
        if !entries.is_empty() && results.is_empty() {
            return Err(Error::UpstreamUnavailable(format!("all {} page fetches failed", entries.len())));
        }
        if results.len() < entries.len() {
            tracing::warn!(failed = entries.len() - results.len(), "some pages were skipped");
        }

        let mut page_meta = BTreeMap::new();
        let mut pages = Vec::with_capacity(results.len());
        for result in results {
            page_meta.insert(result.page.path.clone(), PageMeta { lastmod: result.lastmod });
            pages.push(result.page);
        }

        let metadata = CacheMetadata { last_crawl: Utc::now(), ttl_days: settings.ttl_days, pages: page_meta };
        self.store.replace_generation(pages, &metadata).await?;

        let committed = self.store.load_all_pages().await?;
        let count = committed.len();
        self.index.store(Arc::new(SearchIndex::from_pages(committed)?));
        self.gate.mark_ready();

        tracing::info!(pages = count, "indexed documentation");
        Ok(count)
    }
}
