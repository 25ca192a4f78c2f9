//! MCP tool implementations.
//!
//! This module contains all tools exposed by the linkpeek server.

pub mod cache;
pub mod detect_urls;
pub mod link_preview;
pub mod link_preview_batch;

pub use cache::{CacheClearParams, CachePurgeParams, clear_impl, purge_impl};
pub use detect_urls::{DetectUrlsParams, detect_impl};
pub use link_preview::{LinkPreviewParams, preview_impl};
pub use link_preview_batch::{LinkPreviewBatchParams, batch_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Wrap a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| McpError::internal_error(format!("failed to serialize output: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use linkpeek_client::{FetchCoordinator, HttpExtractor};
    use linkpeek_core::Metadata;
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use std::time::Duration;

    /// Memory-only coordinator whose cache is primed for `urls`, so tools can
    /// run without network access.
    pub fn primed_coordinator(urls: &[&str]) -> FetchCoordinator {
        let extractor = HttpExtractor::new(Default::default()).unwrap();
        let coordinator = FetchCoordinator::memory_only(Arc::new(extractor), Duration::from_secs(600));
        for url in urls {
            coordinator.cache().set(url, metadata(url));
        }
        coordinator
    }

    pub fn metadata(url: &str) -> Metadata {
        Metadata {
            title: Some(format!("Title of {url}")),
            description: Some("cached".into()),
            images: vec![format!("{url}/cover.png")],
            site_name: Some("Example".into()),
            final_url: url.to_string(),
            is_valid: true,
        }
    }

    pub fn parse_output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
