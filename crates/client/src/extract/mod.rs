//! Metadata extraction engine.
//!
//! The fetch layer only depends on the [`Extractor`] trait. [`HttpExtractor`]
//! is the default engine: it downloads the page and reads Open Graph / Twitter
//! card / plain HTML tags. It also owns the longer-lived persistent tier:
//! fresh records are served before going to the network, and only network
//! results are written back.

pub mod meta;

pub use meta::{image_metadata, parse_metadata};

use async_trait::async_trait;
use linkpeek_core::{AppConfig, Metadata, PersistedPreview, PreviewError};
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::{FetchClient, FetchConfig};
use crate::store::PersistentSlot;

/// Turns a URL into preview metadata.
///
/// Implementations own transport, parsing and any caching of their own.
/// `skip_cache` asks them to bypass that caching.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str, skip_cache: bool) -> Result<Metadata, PreviewError>;
}

/// Default engine backed by reqwest and scraper.
pub struct HttpExtractor {
    client: FetchClient,
    persistent: Option<Arc<PersistentSlot>>,
    persistent_ttl: chrono::Duration,
}

impl HttpExtractor {
    pub fn new(config: FetchConfig) -> Result<Self, PreviewError> {
        Ok(Self { client: FetchClient::new(config)?, persistent: None, persistent_ttl: chrono::Duration::zero() })
    }

    /// Engine configured from application settings, without persistence.
    pub fn from_config(config: &AppConfig) -> Result<Self, PreviewError> {
        Self::new(FetchConfig::from(config))
    }

    /// Serve persisted previews younger than `ttl` before going to the network.
    pub fn with_persistent(mut self, slot: Arc<PersistentSlot>, ttl: Duration) -> Self {
        self.persistent = Some(slot);
        self.persistent_ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        self
    }

    async fn persisted(&self, url: &str) -> Option<Metadata> {
        let store = self.persistent.as_ref()?.acquire().await?;

        let bytes = match store.get(url).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!("persistent preview lookup failed for {url}: {e}");
                return None;
            }
        };

        match PersistedPreview::from_bytes(&bytes) {
            Ok(record) if record.is_fresh(self.persistent_ttl) => Some(record.metadata),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("discarding unreadable persisted preview for {url}: {e}");
                None
            }
        }
    }

    async fn fetch_metadata(&self, url: &str, no_cache: bool) -> Result<Metadata, PreviewError> {
        let response = self.client.fetch(url, no_cache).await?;

        if response.is_image() {
            return Ok(image_metadata(&response.final_url));
        }
        if !response.is_html() {
            return Err(PreviewError::Parse(format!(
                "{url}: unsupported content type {}",
                response.content_type.as_deref().unwrap_or("unknown")
            )));
        }
        if response.truncated {
            tracing::debug!(bytes = response.bytes.len(), "parsing truncated document for {url}");
        }

        let html = String::from_utf8_lossy(&response.bytes);
        Ok(parse_metadata(&html, &response.final_url))
    }

    /// Best-effort write of freshly fetched metadata to the persistent store.
    ///
    /// Only network results come through here, so a record's age always
    /// counts from the fetch that produced it.
    async fn remember(&self, url: &str, metadata: &Metadata) {
        let Some(slot) = &self.persistent else { return };
        let Some(store) = slot.acquire().await else { return };

        let result = match PersistedPreview::new(metadata.clone()).to_bytes() {
            Ok(bytes) => store.set(url, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("failed to persist preview for {url}: {e}");
        }
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str, skip_cache: bool) -> Result<Metadata, PreviewError> {
        if !skip_cache && let Some(metadata) = self.persisted(url).await {
            tracing::debug!("persistent cache hit for {url}");
            return Ok(metadata);
        }

        let metadata = self.fetch_metadata(url, skip_cache).await?;
        self.remember(url, &metadata).await;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpeek_core::{CacheDb, PersistentStore};

    fn cached_metadata() -> Metadata {
        Metadata {
            title: Some("Persisted".into()),
            final_url: "https://example.invalid".into(),
            is_valid: true,
            ..Default::default()
        }
    }

    async fn extractor_with_record(record: PersistedPreview) -> HttpExtractor {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set("https://example.invalid", &record.to_bytes().unwrap()).await.unwrap();
        let slot = Arc::new(PersistentSlot::ready(Arc::new(db)));
        HttpExtractor::new(FetchConfig::default())
            .unwrap()
            .with_persistent(slot, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_fresh_persisted_preview_served() {
        let extractor = extractor_with_record(PersistedPreview::new(cached_metadata())).await;
        let metadata = extractor.extract("https://example.invalid", false).await.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Persisted"));
    }

    #[tokio::test]
    async fn test_stale_persisted_preview_ignored() {
        let mut record = PersistedPreview::new(cached_metadata());
        record.stored_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let extractor = extractor_with_record(record).await;

        assert!(extractor.persisted("https://example.invalid").await.is_none());
    }

    #[tokio::test]
    async fn test_persisted_hit_is_not_rewritten() {
        let mut record = PersistedPreview::new(cached_metadata());
        record.stored_at = chrono::Utc::now() - chrono::Duration::minutes(50);
        let stored = record.to_bytes().unwrap();
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set("https://example.invalid", &stored).await.unwrap();
        let extractor = HttpExtractor::new(FetchConfig::default())
            .unwrap()
            .with_persistent(Arc::new(PersistentSlot::ready(Arc::new(db.clone()))), Duration::from_secs(3600));

        extractor.extract("https://example.invalid", false).await.unwrap();
        extractor.extract("https://example.invalid", false).await.unwrap();

        assert_eq!(db.get("https://example.invalid").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_remember_writes_fresh_record() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let extractor = HttpExtractor::new(FetchConfig::default())
            .unwrap()
            .with_persistent(Arc::new(PersistentSlot::ready(Arc::new(db.clone()))), Duration::from_secs(3600));

        extractor.remember("https://example.invalid", &cached_metadata()).await;

        assert_eq!(extractor.persisted("https://example.invalid").await, Some(cached_metadata()));
        assert_eq!(db.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remember_without_store_is_noop() {
        let extractor = HttpExtractor::new(FetchConfig::default()).unwrap();
        extractor.remember("https://example.invalid", &cached_metadata()).await;
        assert!(extractor.persisted("https://example.invalid").await.is_none());
    }

    #[tokio::test]
    async fn test_persisted_lookup_without_store() {
        let extractor = HttpExtractor::new(FetchConfig::default()).unwrap();
        assert!(extractor.persisted("https://example.invalid").await.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_invalid_input() {
        let extractor = HttpExtractor::from_config(&AppConfig::default()).unwrap();
        let result = extractor.extract("not a url", true).await;
        assert!(matches!(result, Err(PreviewError::InvalidInput(_))));
    }
}
