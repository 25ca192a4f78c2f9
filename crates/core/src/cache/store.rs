//! Pluggable persistent storage for preview payloads.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;

/// A durable key/value store sitting behind the in-process preview cache.
///
/// Implementations are resolved once, when the owning cache is built.
/// Failures are reported as [`Error`] and never reach callers of the
/// preview fetch layer.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), Error>;

    async fn clear(&self) -> Result<(), Error>;

    /// Delete entries stored more than `max_age` ago. Returns how many went.
    async fn purge_older_than(&self, max_age: chrono::Duration) -> Result<u64, Error>;

    /// Delete entries whose key is on `domain` or one of its subdomains.
    async fn purge_by_domain(&self, domain: &str) -> Result<u64, Error>;

    /// Release the underlying resources. Later calls may fail.
    async fn close(&self) -> Result<(), Error>;
}

#[async_trait]
impl PersistentStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.get_entry(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), Error> {
        self.put_entry(key, value).await
    }

    async fn clear(&self) -> Result<(), Error> {
        let deleted = self.clear_entries().await?;
        tracing::debug!(deleted, "cleared persistent preview cache");
        Ok(())
    }

    async fn purge_older_than(&self, max_age: chrono::Duration) -> Result<u64, Error> {
        CacheDb::purge_older_than(self, max_age).await
    }

    async fn purge_by_domain(&self, domain: &str) -> Result<u64, Error> {
        CacheDb::purge_by_domain(self, domain).await
    }

    async fn close(&self) -> Result<(), Error> {
        self.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cache_db_as_trait_object() {
        let store: Arc<dyn PersistentStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        store.set("https://example.com", b"{}").await.unwrap();
        assert_eq!(store.get("https://example.com").await.unwrap(), Some(b"{}".to_vec()));

        store.clear().await.unwrap();
        assert!(store.get("https://example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purges_through_trait_object() {
        let store: Arc<dyn PersistentStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        store.set("https://blog.example.com/post", b"{}").await.unwrap();
        store.set("https://other.org", b"{}").await.unwrap();

        assert_eq!(store.purge_by_domain("example.com").await.unwrap(), 1);
        assert_eq!(store.purge_older_than(chrono::Duration::hours(1)).await.unwrap(), 0);
        assert!(store.get("https://other.org").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_closed_store_reports_errors() {
        let store = CacheDb::open_in_memory().await.unwrap();
        PersistentStore::close(&store).await.unwrap();
        assert!(PersistentStore::get(&store, "https://example.com").await.is_err());
    }
}
