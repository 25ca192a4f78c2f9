//! link_preview tool implementation.
//!
//! Resolves preview metadata for one URL through the shared coordinator.

use linkpeek_client::{FetchCoordinator, detect_url_type, get_domain_from_url, normalize_url};
use linkpeek_core::Metadata;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Input parameters for link_preview tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LinkPreviewParams {
    /// The URL to preview. A missing scheme defaults to https.
    pub url: String,

    /// Ignore cached previews and fetch again.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Output structure for link_preview tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkPreviewOutput {
    /// Canonical form of the requested URL.
    pub url: String,
    /// Host without a leading `www.`.
    pub domain: String,
    /// Coarse content category: video, social_media, image, product or article.
    pub url_type: String,
    /// Extracted preview metadata.
    pub metadata: Metadata,
}

impl LinkPreviewOutput {
    pub fn new(url: &str, metadata: Metadata) -> Self {
        let url = normalize_url(url);
        Self {
            domain: get_domain_from_url(&url),
            url_type: detect_url_type(&url).as_str().to_string(),
            url,
            metadata,
        }
    }
}

/// Implementation of the link_preview tool.
pub async fn preview_impl(
    coordinator: &FetchCoordinator, params: LinkPreviewParams,
) -> Result<CallToolResult, McpError> {
    let metadata = coordinator.get_metadata(&params.url, params.force_refresh).await?;
    json_result(&LinkPreviewOutput::new(&params.url, metadata))
}
