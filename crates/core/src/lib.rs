//! Core types and shared functionality for linkpeek.
//!
//! This crate provides:
//! - Link preview metadata model
//! - Persistent preview cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;

pub use cache::{CacheDb, PersistentStore};
pub use config::{AppConfig, BatchFailurePolicy, ConfigError};
pub use error::{Error, PreviewError};
pub use metadata::{Metadata, PersistedPreview};
