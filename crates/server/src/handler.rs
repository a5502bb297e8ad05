//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    GetPageParams, SearchDocsParams, SyncDocsParams, page::get_page_impl, search::search_impl,
    sections::list_sections_impl, sync::sync_impl,
};

use docmirror_core::DocsService;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for docs-mcp.
#[derive(Clone)]
pub struct DocsServer {
    tool_router: ToolRouter<Self>,
    service: DocsService,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl DocsServer {
    /// Create a new server handler over `service`.
    pub fn new(service: DocsService) -> Self {
        Self { tool_router: Self::tool_router(), service }
    }

    #[tool(description = "Check and sync the documentation cache. Runs automatically on first use or when the cache has expired.")]
    async fn sync_docs(&self, params: Parameters<SyncDocsParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.service, params.0).await
    }

    #[tool(description = "Search the documentation and return relevant page summaries ranked by relevance.")]
    async fn search_docs(&self, params: Parameters<SearchDocsParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.service, params.0).await
    }

    #[tool(description = "Get the full content of a documentation page by path, e.g. /getting-started.")]
    async fn get_page(&self, params: Parameters<GetPageParams>) -> Result<CallToolResult, McpError> {
        get_page_impl(&self.service, params.0).await
    }

    #[tool(description = "List the documentation structure as a tree of sections for navigation.")]
    async fn list_sections(&self) -> Result<CallToolResult, McpError> {
        list_sections_impl(&self.service).await
    }
}

impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "docs-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline mirror of a documentation site. Use search_docs to find pages, get_page to read one, \
                 list_sections to browse, and sync_docs to refresh."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::service;

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let (service, _dir) = service().await;
        let server = DocsServer::new(service);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["get_page", "list_sections", "search_docs", "sync_docs"]);
    }

    #[tokio::test]
    async fn test_server_info_names_server() {
        let (service, _dir) = service().await;
        let info = DocsServer::new(service).get_info();
        assert_eq!(info.server_info.name, "docs-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
