//! get_page tool implementation.
//!
//! Returns the full content of one documentation page by path.

use docmirror_core::{DocsService, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the get_page tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetPageParams {
    /// Page path, e.g. `/getting-started`.
    pub path: String,
}

/// Output from the get_page tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetPageOutput {
    pub title: String,
    pub url: String,
    pub path: String,
    /// Page body as markdown-like text.
    pub content: String,
}

/// Implementation of the get_page tool.
pub async fn get_page_impl(service: &DocsService, params: GetPageParams) -> Result<CallToolResult, McpError> {
    service.ensure_ready().await?;
    let page = service
        .get_page(&params.path)?
        .ok_or_else(|| Error::NotFound(format!("page {}", params.path)))?;

    json_result(&GetPageOutput { title: page.title, url: page.url, path: page.path, content: page.content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{decode, service};

    #[tokio::test]
    async fn test_get_page_found() {
        let (service, _dir) = service().await;

        let params = GetPageParams { path: "/getting-started".into() };
        let output: GetPageOutput = decode(&get_page_impl(&service, params).await.unwrap());

        assert_eq!(output.title, "Getting Started");
        assert_eq!(output.path, "/getting-started");
        assert!(output.content.contains("first diff"));
    }

    #[tokio::test]
    async fn test_get_page_normalizes_path() {
        let (service, _dir) = service().await;

        let params = GetPageParams { path: "features/schema/".into() };
        let output: GetPageOutput = decode(&get_page_impl(&service, params).await.unwrap());

        assert_eq!(output.path, "/features/schema");
    }

    #[tokio::test]
    async fn test_get_page_missing_is_not_found() {
        let (service, _dir) = service().await;

        let params = GetPageParams { path: "/nope".into() };
        let err = get_page_impl(&service, params).await.unwrap_err();

        assert_eq!(err.code.0, -32001);
        assert!(err.message.starts_with("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_get_page_blank_path_is_invalid_params() {
        let (service, _dir) = service().await;

        let params = GetPageParams { path: " ".into() };
        let err = get_page_impl(&service, params).await.unwrap_err();

        assert_eq!(err.code.0, -32602);
        assert!(err.message.starts_with("INVALID_INPUT"));
    }
}
