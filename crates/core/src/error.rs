//! Unified error types for linkpeek.
//!
//! [`Error`] covers storage and maintenance failures. [`PreviewError`] is the
//! taxonomy seen by callers of the fetch layer; it is `Clone` so a single
//! outcome can be handed to every caller waiting on the same URL.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Storage-level errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Persistent store could not be opened or written.
    #[error("STORAGE_UNAVAILABLE: {0}")]
    StorageUnavailable(String),

    /// Stored payload could not be encoded or decoded.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Errors surfaced by the preview fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// Empty or unusable URL. Never retried.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Transport failure or non-success HTTP status.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The extraction engine gave up waiting.
    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    /// The response could not be turned into metadata.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// The fetch task died before producing a result.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl From<PreviewError> for McpError {
    fn from(err: PreviewError) -> Self {
        let (code, message) = match &err {
            PreviewError::InvalidInput(msg) => (-32602, msg.clone()),
            PreviewError::Network(msg) => (-32008, msg.clone()),
            PreviewError::Timeout(msg) => (-32006, msg.clone()),
            PreviewError::Parse(msg) => (-32000, msg.clone()),
            PreviewError::Internal(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        McpError { code: ErrorCode(-32002), message: err.to_string().into(), data: None }
    }
}
