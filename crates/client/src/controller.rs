//! Observable preview state for a single tracked URL.
//!
//! Every fetch is stamped with a generation number. A result is only applied
//! if no newer `set_url`, `fetch_data` or `clear` happened while it was in
//! flight; otherwise it is dropped and the newer state stands.

use linkpeek_core::{Metadata, PreviewError};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::coordinator::FetchCoordinator;
use crate::store::lock;

const NOTIFY_CAPACITY: usize = 16;

/// Where a controller is in its load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PreviewState {
    #[default]
    Idle,
    Loading { url: String },
    Loaded { url: String, metadata: Metadata },
    Failed { url: String, error: PreviewError },
}

impl PreviewState {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { url } | Self::Loaded { url, .. } | Self::Failed { url, .. } => Some(url),
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::Loaded { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PreviewError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

#[derive(Default)]
struct ControllerInner {
    url: Option<String>,
    state: PreviewState,
    generation: u64,
    disposed: bool,
}

/// Drives [`PreviewState`] for one URL through a shared [`FetchCoordinator`].
///
/// Subscribers receive every transition in order; dropping the receiver
/// unsubscribes.
pub struct PreviewController {
    coordinator: FetchCoordinator,
    inner: Mutex<ControllerInner>,
    notifier: broadcast::Sender<PreviewState>,
}

impl PreviewController {
    pub fn new(coordinator: FetchCoordinator) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { coordinator, inner: Mutex::new(ControllerInner::default()), notifier }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PreviewState {
        lock(&self.inner).state.clone()
    }

    /// The tracked URL, if any.
    pub fn url(&self) -> Option<String> {
        lock(&self.inner).url.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewState> {
        self.notifier.subscribe()
    }

    /// Track `url` and load it.
    ///
    /// Does nothing for a missing or empty URL, or for the URL already tracked
    /// unless `force_refresh` is set.
    pub async fn set_url(&self, url: Option<&str>, force_refresh: bool) {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return;
        };

        {
            let mut inner = lock(&self.inner);
            if inner.disposed || (!force_refresh && inner.url.as_deref() == Some(url)) {
                return;
            }
            inner.url = Some(url.to_string());
        }

        self.fetch_data(force_refresh).await;
    }

    /// Load the tracked URL. Does nothing when no URL is tracked.
    pub async fn fetch_data(&self, force_refresh: bool) {
        let (url, generation) = {
            let mut inner = lock(&self.inner);
            if inner.disposed {
                return;
            }
            let Some(url) = inner.url.clone() else {
                return;
            };
            inner.generation += 1;
            let generation = inner.generation;
            self.transition(&mut inner, PreviewState::Loading { url: url.clone() });
            (url, generation)
        };

        let result = self.coordinator.get_metadata(&url, force_refresh).await;

        let mut inner = lock(&self.inner);
        if inner.disposed || inner.generation != generation {
            tracing::debug!("discarding stale preview result for {url}");
            return;
        }
        let next = match result {
            Ok(metadata) => PreviewState::Loaded { url, metadata },
            Err(error) => PreviewState::Failed { url, error },
        };
        self.transition(&mut inner, next);
    }

    /// Forget the tracked URL and return to [`PreviewState::Idle`].
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        if inner.disposed {
            return;
        }
        inner.generation += 1;
        inner.url = None;
        self.transition(&mut inner, PreviewState::Idle);
    }

    /// Stop acting on results and stop notifying. In-flight fetches still
    /// complete and populate the shared cache.
    pub fn dispose(&self) {
        lock(&self.inner).disposed = true;
    }

    fn transition(&self, inner: &mut ControllerInner, state: PreviewState) {
        inner.state = state.clone();
        // no subscribers is fine
        let _ = self.notifier.send(state);
    }
}
