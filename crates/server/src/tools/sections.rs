//! list_sections tool implementation.

use docmirror_core::{DocsService, SectionNode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use super::json_result;

/// Output from the list_sections tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListSectionsOutput {
    /// Pages grouped by path segment; `_pages` lists the pages of each node.
    pub sections: SectionNode,
}

/// Implementation of the list_sections tool.
pub async fn list_sections_impl(service: &DocsService) -> Result<CallToolResult, McpError> {
    service.ensure_ready().await?;
    json_result(&ListSectionsOutput { sections: service.list_sections()? })
}
