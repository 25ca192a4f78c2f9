//! Client side of linkpeek.
//!
//! This crate provides URL utilities, the metadata extraction engine, the
//! deduplicating fetch coordinator with its two-tier cache, windowed batch
//! fetching and the observable preview controller.

pub mod batch;
pub mod controller;
pub mod coordinator;
pub mod extract;
pub mod fetch;
pub mod links;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{PreviewController, PreviewState};
pub use coordinator::FetchCoordinator;
pub use extract::{Extractor, HttpExtractor, image_metadata, parse_metadata};
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use links::{
    UrlMatch, UrlType, detect_url_type, detect_urls, extract_first_url, get_domain_from_url, normalize_url,
};
pub use store::{CacheEntry, CacheStore, PersistentSlot};
