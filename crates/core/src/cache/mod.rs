//! SQLite-backed persistent store for link previews.
//!
//! This module provides a key-addressed preview cache using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Hashed keys using SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Purging by age or domain

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::PersistentStore;
