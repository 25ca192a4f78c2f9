//! Deduplicating, cache-fronted access to the extraction engine.
//!
//! ### Request collapsing
//! - One in-flight fetch per canonical URL; later callers join it
//! - Checking for an in-flight fetch, consulting the cache and claiming a new
//!   slot happen under one lock, which is never held across the engine call
//! - Slots are released by a drop guard inside the fetch task, so neither
//!   failure nor a panicking engine can leave a key permanently pending
//!
//! ### Caching
//! - Results land in the ephemeral tier before the slot is released
//! - The persistent tier belongs to the engine; this layer only clears and
//!   closes it

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use linkpeek_core::{AppConfig, Metadata, PreviewError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::extract::{Extractor, HttpExtractor};
use crate::links::normalize_url;
use crate::store::{CacheStore, PersistentSlot, lock};

type SharedFetch = Shared<BoxFuture<'static, Result<Metadata, PreviewError>>>;

/// An in-flight fetch and the ticket of the caller that started it.
struct PendingSlot {
    ticket: u64,
    fetch: SharedFetch,
}

enum Lookup {
    Cached(Metadata),
    Joined(SharedFetch),
    Claimed(SharedFetch),
}

struct Inner {
    extractor: Arc<dyn Extractor>,
    store: CacheStore,
    pending: Mutex<HashMap<String, PendingSlot>>,
    next_ticket: AtomicU64,
}

/// Releases a pending slot when the fetch task ends, however it ends.
struct SlotRelease {
    inner: Arc<Inner>,
    key: String,
    ticket: u64,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        let mut pending = lock(&self.inner.pending);
        if pending.get(&self.key).is_some_and(|slot| slot.ticket == self.ticket) {
            pending.remove(&self.key);
        }
    }
}

/// Shared handle to the preview fetch layer.
///
/// Clones share one cache, one pending-request registry and one persistent
/// store handle.
#[derive(Clone)]
pub struct FetchCoordinator {
    inner: Arc<Inner>,
}

impl FetchCoordinator {
    pub fn new(extractor: Arc<dyn Extractor>, store: CacheStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                extractor,
                store,
                pending: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Coordinator with a memory-only cache.
    pub fn memory_only(extractor: Arc<dyn Extractor>, ttl: Duration) -> Self {
        Self::new(extractor, CacheStore::new(ttl))
    }

    /// Coordinator wired from application settings: the default HTTP engine,
    /// and, when enabled, a SQLite store opened on first use and shared by the
    /// cache and the engine.
    pub fn from_config(config: &AppConfig) -> Result<Self, PreviewError> {
        let extractor = HttpExtractor::from_config(config)?;

        if !config.persistent_cache {
            return Ok(Self::memory_only(Arc::new(extractor), config.cache_ttl()));
        }

        let slot = Arc::new(PersistentSlot::sqlite(&config.db_path));
        let extractor = extractor.with_persistent(Arc::clone(&slot), config.persistent_ttl());
        let store = CacheStore::with_persistent(config.cache_ttl(), slot);
        Ok(Self::new(Arc::new(extractor), store))
    }

    /// Preview metadata for `url`.
    ///
    /// Concurrent calls for the same canonical URL share one engine call and
    /// receive the same result or error. With `force_refresh`, a valid cache
    /// entry is ignored and the engine is asked to skip its own cache.
    pub async fn get_metadata(&self, url: &str, force_refresh: bool) -> Result<Metadata, PreviewError> {
        if url.trim().is_empty() {
            return Err(PreviewError::InvalidInput("url cannot be empty".into()));
        }

        let key = normalize_url(url);
        match self.check_and_claim(&key, force_refresh) {
            Lookup::Cached(metadata) => {
                tracing::debug!("cache hit for {key}");
                Ok(metadata)
            }
            Lookup::Joined(fetch) => {
                tracing::debug!("joining in-flight fetch for {key}");
                fetch.await
            }
            Lookup::Claimed(fetch) => fetch.await,
        }
    }

    fn check_and_claim(&self, key: &str, force_refresh: bool) -> Lookup {
        let mut pending = lock(&self.inner.pending);

        if let Some(slot) = pending.get(key) {
            return Lookup::Joined(slot.fetch.clone());
        }

        if !force_refresh && let Some(entry) = self.inner.store.get(key) {
            return Lookup::Cached(entry.value);
        }

        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let fetch = self.spawn_fetch(key.to_string(), ticket, force_refresh);
        pending.insert(key.to_string(), PendingSlot { ticket, fetch: fetch.clone() });
        Lookup::Claimed(fetch)
    }

    /// Run the engine call as its own task so it completes even if every
    /// waiter goes away.
    fn spawn_fetch(&self, key: String, ticket: u64, skip_cache: bool) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        tracing::debug!(skip_cache, "fetching preview for {key}");

        let task = tokio::spawn(async move {
            let release = SlotRelease { inner: Arc::clone(&inner), key: key.clone(), ticket };
            let result = inner.extractor.extract(&key, skip_cache).await;

            match &result {
                Ok(metadata) => inner.store.set(&key, metadata.clone()),
                Err(e) => tracing::debug!("preview fetch failed for {key}: {e}"),
            }
            drop(release);
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(PreviewError::Internal(format!("preview fetch task failed: {e}"))))
        }
        .boxed()
        .shared()
    }

    /// Number of fetches currently in flight.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// The two-tier cache behind this coordinator.
    pub fn cache(&self) -> &CacheStore {
        &self.inner.store
    }

    /// Drop every ephemeral cache entry.
    pub fn clear_cache(&self) {
        self.inner.store.clear_ephemeral();
    }

    /// Clear the persistent cache tier, if present.
    pub async fn clear_persistent_cache(&self) {
        self.inner.store.clear_persistent().await;
    }

    /// Release the persistent store. The coordinator keeps working memory-only.
    pub async fn close(&self) {
        self.inner.store.close().await;
    }
}
