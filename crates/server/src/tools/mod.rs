//! MCP tool implementations.
//!
//! This module contains all tools exposed by the docs-mcp server. Every read
//! tool makes sure the documentation mirror is ready before answering.

pub mod page;
pub mod search;
pub mod sections;
pub mod sync;

pub use page::{GetPageOutput, GetPageParams};
pub use search::{SearchDocsOutput, SearchDocsParams};
pub use sections::ListSectionsOutput;
pub use sync::SyncDocsParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Serialize `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(docmirror_core::Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use docmirror_core::crawl::StaticCrawler;
    use docmirror_core::{DocsService, DocsServiceOptions, Page};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;

    pub const BASE: &str = "https://docs.example.com";

    pub fn page(path: &str, title: &str, content: &str) -> Page {
        Page {
            path: path.into(),
            url: format!("{BASE}{path}"),
            title: title.into(),
            content: content.into(),
            snippet: content.chars().take(60).collect(),
        }
    }

    pub fn upstream_pages() -> Vec<Page> {
        vec![
            page("/", "Welcome", "Documentation home."),
            page("/getting-started", "Getting Started", "Install the package and run your first diff."),
            page("/features/lineage", "Lineage Diff", "Compare lineage between two environments."),
            page("/features/schema", "Schema Diff", "Schema changes are highlighted."),
        ]
    }

    /// Service over a temporary cache root fed by a static crawler.
    pub async fn service_with(crawler: StaticCrawler) -> (DocsService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut options = DocsServiceOptions::new(dir.path());
        options.docs_base_url = BASE.into();
        let service = DocsService::open(options, Arc::new(crawler)).await.unwrap();
        (service, dir)
    }

    pub async fn service() -> (DocsService, tempfile::TempDir) {
        service_with(StaticCrawler::new(upstream_pages())).await
    }

    /// Decode the JSON text content of a tool result.
    pub fn decode<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let text = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .expect("tool result has no text content");
        serde_json::from_str(&text).unwrap()
    }

    pub fn decode_value(result: &CallToolResult) -> serde_json::Value {
        decode(result)
    }
}
