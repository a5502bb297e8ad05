//! sync_docs tool implementation.
//!
//! Refreshes the documentation mirror when forced or stale. Failures are
//! reported in the returned status, not as tool errors.

use docmirror_core::DocsService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sync_docs tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SyncDocsParams {
    /// Force a re-crawl even if the cache is still fresh.
    #[serde(default)]
    pub force: bool,
}

/// Implementation of the sync_docs tool.
pub async fn sync_impl(service: &DocsService, params: SyncDocsParams) -> Result<CallToolResult, McpError> {
    let status = service.sync(params.force).await;
    json_result(&status)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use docmirror_core::crawl::StaticCrawler;
    use docmirror_core::{SyncState, SyncStatus};

    use super::*;
    use crate::tools::test_support::{decode, decode_value, service, service_with, upstream_pages};

    #[test]
    fn test_params_default_force_false() {
        let params: SyncDocsParams = serde_json::from_str("{}").unwrap();
        assert!(!params.force);
    }

    #[tokio::test]
    async fn test_sync_populates_cache() {
        let (service, _dir) = service().await;

        let result = sync_impl(&service, SyncDocsParams::default()).await.unwrap();
        let status: SyncStatus = decode(&result);

        assert_eq!(status.status, SyncState::Synced);
        assert_eq!(status.total_pages, 4);
        assert!(status.last_sync.is_some());
        assert!(status.next_check.is_some());
    }

    #[tokio::test]
    async fn test_second_sync_is_up_to_date() {
        let crawler = StaticCrawler::new(upstream_pages());
        let calls = crawler.list_calls();
        let (service, _dir) = service_with(crawler).await;

        sync_impl(&service, SyncDocsParams::default()).await.unwrap();
        let result = sync_impl(&service, SyncDocsParams::default()).await.unwrap();

        let value = decode_value(&result);
        assert_eq!(value["status"], "up_to_date");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sync_impl(&service, SyncDocsParams { force: true }).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sync_failure_reported_in_status() {
        let (service, _dir) = service_with(StaticCrawler::new(Vec::new()).unreachable()).await;

        let result = sync_impl(&service, SyncDocsParams::default()).await.unwrap();
        let status: SyncStatus = decode(&result);

        assert_eq!(status.status, SyncState::Error);
        assert!(status.error.is_some());
    }
}
