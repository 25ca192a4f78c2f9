//! Scripted extraction engine for exercising the fetch layer.

use async_trait::async_trait;
use linkpeek_core::{Metadata, PreviewError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::extract::Extractor;
use crate::store::lock;

/// Fake engine with per-URL delays and failures that records every call.
#[derive(Default)]
pub struct ScriptedExtractor {
    default_delay: Duration,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, PreviewError>,
    panics: Vec<String>,
    requested: Mutex<Vec<String>>,
    skip_cache: Mutex<Vec<bool>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn failing(mut self, url: &str, error: PreviewError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    pub fn panicking(mut self, url: &str) -> Self {
        self.panics.push(url.to_string());
        self
    }

    /// Metadata this engine returns for `url`.
    pub fn metadata_for(url: &str) -> Metadata {
        Metadata {
            title: Some(format!("Title of {url}")),
            description: Some("scripted".into()),
            images: Vec::new(),
            site_name: None,
            final_url: url.to_string(),
            is_valid: true,
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.requested).len()
    }

    pub fn requested(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }

    pub fn skip_cache_flags(&self) -> Vec<bool> {
        lock(&self.skip_cache).clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, url: &str, skip_cache: bool) -> Result<Metadata, PreviewError> {
        lock(&self.requested).push(url.to_string());
        lock(&self.skip_cache).push(skip_cache);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.iter().any(|p| p == url) {
            panic!("scripted panic for {url}");
        }
        match self.failures.get(url) {
            Some(error) => Err(error.clone()),
            None => Ok(Self::metadata_for(url)),
        }
    }
}
