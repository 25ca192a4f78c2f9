//! link_preview_batch tool implementation.
//!
//! Previews several URLs in windows of bounded concurrency, keeping input order.

use linkpeek_client::FetchCoordinator;
use linkpeek_core::{AppConfig, BatchFailurePolicy};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use crate::tools::link_preview::LinkPreviewOutput;

const MAX_CONCURRENCY: usize = 32;

/// Input parameters for link_preview_batch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LinkPreviewBatchParams {
    /// URLs to preview.
    pub urls: Vec<String>,

    /// Ignore cached previews and fetch again.
    #[serde(default)]
    pub force_refresh: bool,

    /// URLs fetched per window (default from server config, max: 32).
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Fail the whole batch on the first error instead of returning placeholders.
    #[serde(default)]
    pub fail_fast: Option<bool>,
}

/// Batch summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    /// Total number of URLs processed.
    pub total: u32,
    /// Number of previews with a title or description.
    pub valid: u32,
    /// Number of empty or placeholder previews.
    pub invalid: u32,
}

/// Output structure for link_preview_batch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkPreviewBatchOutput {
    /// One preview per input URL, in input order.
    pub results: Vec<LinkPreviewOutput>,
    /// Summary statistics.
    pub summary: BatchSummary,
}

/// Implementation of the link_preview_batch tool.
pub async fn batch_impl(
    coordinator: &FetchCoordinator, config: &AppConfig, params: LinkPreviewBatchParams,
) -> Result<CallToolResult, McpError> {
    let concurrency = params.concurrency.unwrap_or(config.batch_concurrency).min(MAX_CONCURRENCY);
    let policy = match params.fail_fast {
        Some(true) => BatchFailurePolicy::Propagate,
        Some(false) => BatchFailurePolicy::Placeholder,
        None => config.batch_failure_policy,
    };

    let previews = coordinator
        .get_multiple_metadata(params.urls.as_slice(), params.force_refresh, concurrency, policy)
        .await?;

    let results: Vec<LinkPreviewOutput> = params
        .urls
        .iter()
        .zip(previews)
        .map(|(url, metadata)| LinkPreviewOutput::new(url, metadata))
        .collect();

    let valid = results.iter().filter(|r| r.metadata.is_valid).count() as u32;
    let total = results.len() as u32;
    let output = LinkPreviewBatchOutput { results, summary: BatchSummary { total, valid, invalid: total - valid } };
    json_result(&output)
}
