//! cache_clear tool implementation.
//!
//! Drops in-process previews and, on request, the persisted ones.

use linkpeek_client::FetchCoordinator;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// Also clear the persistent SQLite cache.
    #[serde(default)]
    pub persistent: bool,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of in-process entries dropped.
    pub cleared: usize,
    /// Whether the persistent cache was cleared as well.
    pub persistent: bool,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(coordinator: &FetchCoordinator, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let cleared = coordinator.cache().len();
    coordinator.clear_cache();
    if params.persistent {
        coordinator.clear_persistent_cache().await;
    }

    json_result(&CacheClearOutput { cleared, persistent: params.persistent })
}
