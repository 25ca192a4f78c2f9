//! Link preview metadata as produced by the extraction engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Preview metadata for a single URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Metadata {
    /// Page title.
    pub title: Option<String>,
    /// Short description or summary.
    pub description: Option<String>,
    /// Preview images, most relevant first.
    #[serde(default)]
    pub images: Vec<String>,
    /// Human-readable site name.
    pub site_name: Option<String>,
    /// URL the content was served from after redirects.
    pub final_url: String,
    /// Whether the page yielded anything worth previewing.
    pub is_valid: bool,
}

impl Metadata {
    /// Empty, invalid metadata standing in for a URL that could not be fetched.
    pub fn placeholder(url: &str) -> Self {
        Self { final_url: url.to_string(), ..Default::default() }
    }

    /// First preview image, if any.
    pub fn image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Envelope written to a persistent store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPreview {
    pub metadata: Metadata,
    pub stored_at: DateTime<Utc>,
}

impl PersistedPreview {
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata, stored_at: Utc::now() }
    }

    /// Whether the record is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now() - self.stored_at < ttl
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
