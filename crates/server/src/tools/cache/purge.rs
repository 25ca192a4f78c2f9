//! cache_purge tool implementation.
//!
//! Purges persisted previews by age or domain.

use linkpeek_client::FetchCoordinator;
use linkpeek_core::PreviewError;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Purge entries older than this many days.
    pub older_than_days: Option<i64>,

    /// Purge entries served from this domain or its subdomains.
    pub domain: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of persisted entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
///
/// Only the persistent tier is touched; in-process entries expire on their own.
pub async fn purge_impl(coordinator: &FetchCoordinator, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.older_than_days.is_none() && params.domain.is_none() {
        return Err(
            PreviewError::InvalidInput("at least one of older_than_days or domain must be specified".into()).into()
        );
    }

    let mut deleted = 0u64;

    if let Some(days) = params.older_than_days {
        if days < 0 {
            return Err(PreviewError::InvalidInput("older_than_days cannot be negative".into()).into());
        }
        deleted += coordinator
            .cache()
            .purge_persistent_older_than(chrono::Duration::days(days))
            .await?;
    }

    if let Some(domain) = params.domain {
        if domain.trim().is_empty() {
            return Err(PreviewError::InvalidInput("domain cannot be empty".into()).into());
        }
        deleted += coordinator.cache().purge_persistent_domain(&domain).await?;
    }

    json_result(&CachePurgeOutput { deleted })
}
