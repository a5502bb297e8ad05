//! search_docs tool implementation.

use docmirror_core::{DEFAULT_SEARCH_LIMIT, DocsService, SearchResult};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the search_docs tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocsParams {
    /// Search keywords.
    pub query: String,

    /// Number of results to return (default: 5).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Output from the search_docs tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocsOutput {
    /// Matching pages, best first.
    pub results: Vec<SearchResult>,
}

/// Implementation of the search_docs tool.
pub async fn search_impl(service: &DocsService, params: SearchDocsParams) -> Result<CallToolResult, McpError> {
    service.ensure_ready().await?;
    let results = service.search(&params.query, params.limit)?;
    tracing::debug!(query = %params.query, hits = results.len(), "search_docs");
    json_result(&SearchDocsOutput { results })
}
