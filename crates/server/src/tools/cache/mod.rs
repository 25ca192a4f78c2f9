//! Cache-related MCP tools.
//!
//! This module provides tools for managing the preview caches.

pub mod clear;
pub mod purge;

pub use clear::{CacheClearParams, clear_impl};
pub use purge::{CachePurgeParams, purge_impl};
