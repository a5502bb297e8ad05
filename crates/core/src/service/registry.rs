//! Explicit registry of open services, keyed by cache root.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{DocsService, DocsServiceOptions};
use crate::Error;
use crate::crawl::Crawler;

/// Hands out one [`DocsService`] per cache directory.
///
/// Two callers asking for the same directory share the store, index and
/// in-flight sync.
#[derive(Default)]
pub struct DocsRegistry {
    instances: Mutex<HashMap<PathBuf, DocsService>>,
}

impl DocsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing handle for `options.cache_dir`, or a newly opened one.
    ///
    /// `crawler` is only used when a new service is opened.
    pub async fn get_or_open(
        &self, options: DocsServiceOptions, crawler: Arc<dyn Crawler>,
    ) -> Result<DocsService, Error> {
        let mut instances = self.instances.lock().await;
        if let Some(service) = instances.get(&options.cache_dir) {
            return Ok(service.clone());
        }

        let key = options.cache_dir.clone();
        let service = DocsService::open(options, crawler).await?;
        instances.insert(key, service.clone());
        Ok(service)
    }

    /// Forget every handle. Open handles keep working.
    pub async fn reset(&self) {
        self.instances.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.instances.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.lock().await.is_empty()
    }
}
