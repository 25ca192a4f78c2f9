//! Two-tier preview cache.
//!
//! The ephemeral tier is an in-process map with a fixed TTL, checked lazily
//! on read. The persistent tier is optional: it is opened on first use, and
//! if opening fails the cache keeps running memory-only.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use linkpeek_core::{CacheDb, Error, Metadata, PersistentStore};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A cached preview with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Metadata,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_valid(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Deferred constructor for a persistent store.
type StoreOpener = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn PersistentStore>, Error>> + Send + Sync>;

/// Lazily opened handle to a persistent store, shared by the cache and the
/// extraction engine.
pub struct PersistentSlot {
    opener: Option<StoreOpener>,
    handle: OnceCell<Option<Arc<dyn PersistentStore>>>,
    closed: AtomicBool,
}

impl PersistentSlot {
    /// Slot that opens its store with `opener` on first use.
    pub fn new<F, Fut>(opener: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn PersistentStore>, Error>> + Send + 'static,
    {
        let opener: StoreOpener = Box::new(move || opener().boxed());
        Self { opener: Some(opener), handle: OnceCell::new(), closed: AtomicBool::new(false) }
    }

    /// Slot around a store that is already open.
    pub fn ready(store: Arc<dyn PersistentStore>) -> Self {
        Self { opener: None, handle: OnceCell::new_with(Some(Some(store))), closed: AtomicBool::new(false) }
    }

    /// Slot backed by the SQLite database at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || {
            let path = path.clone();
            async move {
                let db = CacheDb::open(&path)
                    .await
                    .map_err(|e| Error::StorageUnavailable(format!("{}: {e}", path.display())))?;
                Ok::<Arc<dyn PersistentStore>, Error>(Arc::new(db))
            }
        })
    }

    /// The open store, opening it if this is the first use.
    ///
    /// Returns None when the store is closed or failed to open.
    pub async fn acquire(&self) -> Option<Arc<dyn PersistentStore>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        self.handle
            .get_or_init(|| async {
                let opener = self.opener.as_ref()?;
                match opener().await {
                    Ok(store) => {
                        tracing::debug!("opened persistent preview store");
                        Some(store)
                    }
                    Err(e) => {
                        tracing::warn!("persistent preview store unavailable, continuing memory-only: {e}");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Close the store if it was opened. Later acquisitions return None.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(Some(store)) = self.handle.get()
            && let Err(e) = store.close().await
        {
            tracing::warn!("failed to close persistent preview store: {e}");
        }
    }
}

/// Ephemeral TTL cache in front of an optional persistent tier.
///
/// Writes only reach the ephemeral tier; the persistent tier is filled by the
/// extraction engine and managed (cleared, purged, closed) from here.
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    persistent: Option<Arc<PersistentSlot>>,
}

impl CacheStore {
    /// Memory-only cache.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, persistent: None }
    }

    /// Cache that also writes through to `slot`.
    pub fn with_persistent(ttl: Duration, slot: Arc<PersistentSlot>) -> Self {
        Self { persistent: Some(slot), ..Self::new(ttl) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Valid ephemeral entry for `key`. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.is_valid() => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!("cache entry expired for {key}");
                None
            }
            None => None,
        }
    }

    /// Store or overwrite the ephemeral entry for `key`.
    pub fn set(&self, key: &str, value: Metadata) {
        let entry = CacheEntry { value, inserted_at: Instant::now(), ttl: self.ttl };
        lock(&self.entries).insert(key.to_string(), entry);
    }

    /// Number of ephemeral entries, including ones not yet evicted.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every ephemeral entry. The persistent tier is untouched.
    pub fn clear_ephemeral(&self) {
        lock(&self.entries).clear();
    }

    /// Clear the persistent tier, if there is one.
    pub async fn clear_persistent(&self) {
        let Some(store) = self.persistent_store().await else { return };
        if let Err(e) = store.clear().await {
            tracing::warn!("failed to clear persistent preview store: {e}");
        }
    }

    /// Delete persisted previews older than `max_age`.
    ///
    /// Returns 0 when there is no persistent tier.
    pub async fn purge_persistent_older_than(&self, max_age: chrono::Duration) -> Result<u64, Error> {
        match self.persistent_store().await {
            Some(store) => store.purge_older_than(max_age).await,
            None => Ok(0),
        }
    }

    /// Delete persisted previews served from `domain` or its subdomains.
    ///
    /// Returns 0 when there is no persistent tier.
    pub async fn purge_persistent_domain(&self, domain: &str) -> Result<u64, Error> {
        match self.persistent_store().await {
            Some(store) => store.purge_by_domain(domain).await,
            None => Ok(0),
        }
    }

    /// Release the persistent tier.
    pub async fn close(&self) {
        if let Some(slot) = &self.persistent {
            slot.close().await;
        }
    }

    async fn persistent_store(&self) -> Option<Arc<dyn PersistentStore>> {
        self.persistent.as_ref()?.acquire().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpeek_core::PersistedPreview;
    use std::sync::atomic::AtomicUsize;

    fn metadata(title: &str) -> Metadata {
        Metadata { title: Some(title.into()), final_url: "https://example.com".into(), is_valid: true, ..Default::default() }
    }

    async fn write_record(db: &CacheDb, key: &str, value: Metadata) {
        db.put_entry(key, &PersistedPreview::new(value).to_bytes().unwrap()).await.unwrap();
    }

    async fn sqlite_slot() -> (Arc<PersistentSlot>, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        (Arc::new(PersistentSlot::ready(Arc::new(db.clone()))), db)
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = CacheStore::new(Duration::from_secs(60));
        store.set("https://example.com", metadata("Example"));

        let entry = store.get("https://example.com").unwrap();
        assert_eq!(entry.value.title.as_deref(), Some("Example"));
        assert_eq!(entry.ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = CacheStore::new(Duration::from_secs(60));
        store.set("https://example.com", metadata("Old"));
        store.set("https://example.com", metadata("New"));

        assert_eq!(store.get("https://example.com").unwrap().value.title.as_deref(), Some("New"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_miss() {
        let store = CacheStore::new(Duration::from_secs(60));
        store.set("https://example.com", metadata("Example"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get("https://example.com").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get("https://example.com").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clear_ephemeral_keeps_persistent() {
        let (slot, db) = sqlite_slot().await;
        let store = CacheStore::with_persistent(Duration::from_secs(60), slot);
        store.set("https://example.com", metadata("Example"));
        write_record(&db, "https://example.com", metadata("Example")).await;

        store.clear_ephemeral();
        assert!(store.get("https://example.com").is_none());
        assert_eq!(db.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_does_not_write_persistent() {
        let (slot, db) = sqlite_slot().await;
        let store = CacheStore::with_persistent(Duration::from_secs(60), slot);
        store.set("https://example.com", metadata("Example"));

        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_persistent() {
        let (slot, db) = sqlite_slot().await;
        let store = CacheStore::with_persistent(Duration::from_secs(60), slot);
        write_record(&db, "https://example.com", metadata("Example")).await;

        store.clear_persistent().await;
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_persistent() {
        let (slot, db) = sqlite_slot().await;
        let store = CacheStore::with_persistent(Duration::from_secs(60), slot);
        write_record(&db, "https://www.example.com/a", metadata("A")).await;
        write_record(&db, "https://notexample.com/b", metadata("B")).await;

        assert_eq!(store.purge_persistent_domain("example.com").await.unwrap(), 1);
        assert_eq!(store.purge_persistent_older_than(chrono::Duration::hours(1)).await.unwrap(), 0);
        assert_eq!(store.purge_persistent_older_than(chrono::Duration::seconds(-1)).await.unwrap(), 1);
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_only_persistent_ops_are_noops() {
        let store = CacheStore::new(Duration::from_secs(60));
        assert_eq!(store.purge_persistent_domain("example.com").await.unwrap(), 0);
        assert_eq!(store.purge_persistent_older_than(chrono::Duration::zero()).await.unwrap(), 0);
        store.clear_persistent().await;
        store.close().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_falls_back_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let slot = PersistentSlot::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<Arc<dyn PersistentStore>, _>(Error::StorageUnavailable("read-only filesystem".into())) }
        });

        assert!(slot.acquire().await.is_none());
        assert!(slot.acquire().await.is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        let store = CacheStore::with_persistent(Duration::from_secs(60), Arc::new(slot));
        store.set("https://example.com", metadata("Example"));
        store.clear_persistent().await;
        assert_eq!(store.purge_persistent_domain("example.com").await.unwrap(), 0);
        assert!(store.get("https://example.com").is_some());
    }

    #[tokio::test]
    async fn test_sqlite_slot_bad_path_is_unavailable() {
        let slot = PersistentSlot::sqlite("/nonexistent-dir/linkpeek/cache.sqlite");
        assert!(slot.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_slot_is_not_acquired() {
        let (slot, _db) = sqlite_slot().await;
        assert!(slot.acquire().await.is_some());

        slot.close().await;
        assert!(slot.acquire().await.is_none());
    }
}
