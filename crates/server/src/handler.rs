//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    CacheClearParams, CachePurgeParams, DetectUrlsParams, LinkPreviewBatchParams, LinkPreviewParams, batch_impl,
    clear_impl, detect_impl, preview_impl, purge_impl,
};

use linkpeek_client::FetchCoordinator;
use linkpeek_core::AppConfig;
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
use std::sync::Arc;

/// The main MCP server handler for linkpeek.
#[derive(Clone)]
pub struct LinkPeekServer {
    coordinator: FetchCoordinator,
    config: Arc<AppConfig>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl LinkPeekServer {
    /// Create a new server handler around a shared coordinator.
    pub fn new(coordinator: FetchCoordinator, config: AppConfig) -> Self {
        Self { coordinator, config: Arc::new(config), tool_router: Self::tool_router() }
    }

    #[tool(description = "Fetch link preview metadata (title, description, images, site name) for a URL.")]
    async fn link_preview(&self, params: Parameters<LinkPreviewParams>) -> Result<CallToolResult, McpError> {
        preview_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Fetch link previews for several URLs with bounded concurrency. Results keep input order.")]
    async fn link_preview_batch(&self, params: Parameters<LinkPreviewBatchParams>) -> Result<CallToolResult, McpError> {
        batch_impl(&self.coordinator, &self.config, params.0).await
    }

    /// No network requests are made.
    #[tool(description = "Find web addresses in free text. Returns each URL with offsets, domain and content type.")]
    async fn detect_urls(&self, params: Parameters<DetectUrlsParams>) -> Result<CallToolResult, McpError> {
        detect_impl(params.0)
    }

    #[tool(description = "Clear cached link previews. Set persistent to also clear the on-disk cache.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        clear_impl(&self.coordinator, params.0).await
    }

    /// Purge persisted previews by age and/or domain.
    #[tool(description = "Purge persisted link previews older than a number of days or served from a domain.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.coordinator, params.0).await
    }
}

impl ServerHandler for LinkPeekServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "linkpeek".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
    use crate::tools::test_support::primed_coordinator;

    #[test]
    fn test_lists_all_tools() {
        let server = LinkPeekServer::new(primed_coordinator(&[]), AppConfig::default());
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_clear", "cache_purge", "detect_urls", "link_preview", "link_preview_batch"]);
    }

    #[test]
    fn test_server_info() {
        let server = LinkPeekServer::new(primed_coordinator(&[]), AppConfig::default());
        let info = server.get_info();
        assert_eq!(info.server_info.name, "linkpeek");
        assert!(info.capabilities.tools.is_some());
    }
}
