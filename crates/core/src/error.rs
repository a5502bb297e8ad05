//! Unified error types for docmirror.
//!
//! Every variant carries a stable code prefix in its `Display` output so
//! transports can surface it without further mapping.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the documentation mirror.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty page path).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Cache database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Storage(tokio_rusqlite::Error),

    /// Filesystem operation on the cache root failed.
    #[error("STORAGE_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Persisted page or metadata does not decode.
    #[error("CORRUPT_DATA: {0}")]
    CorruptData(String),

    /// Serialized search index is not a valid index blob.
    #[error("CORRUPT_INDEX: {0}")]
    CorruptIndex(String),

    /// Building or querying the search index failed.
    #[error("INDEX_ERROR: {0}")]
    Index(String),

    /// Encoding an in-memory structure failed.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Read attempted before the first successful load or sync.
    #[error("NOT_READY: service not ready, call ensure_ready() first")]
    NotReady,

    /// Requested record does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Sitemap could not be fetched, or every page fetch failed.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    UpstreamUnavailable(String),

    /// A single page could not be crawled.
    #[error("PAGE_FETCH_FAILED: {url}: {reason}")]
    PageFetchFailed { url: String, reason: String },

    /// A sync run failed; carries the rendered cause.
    #[error("SYNC_FAILED: {0}")]
    SyncFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Storage(tokio_rusqlite::Error::Close(c)),
            _ => Error::Storage(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidColumnType(idx, name, ty) => {
                Error::CorruptData(format!("column {idx} ({name}) has unexpected type {ty}"))
            }
            rusqlite::Error::FromSqlConversionFailure(idx, ty, cause) => {
                Error::CorruptData(format!("column {idx} ({ty}) failed to decode: {cause}"))
            }
            other => Error::Storage(tokio_rusqlite::Error::Error(other)),
        }
    }
}

impl From<tantivy::TantivyError> for Error {
    fn from(err: tantivy::TantivyError) -> Self {
        Error::Index(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => -32602,
            Error::NotReady => -32000,
            Error::NotFound(_) => -32001,
            Error::Storage(_) | Error::Io(_) | Error::MigrationFailed(_) | Error::Index(_) => -32002,
            Error::CorruptData(_) | Error::CorruptIndex(_) | Error::Serialization(_) => -32003,
            Error::UpstreamUnavailable(_) | Error::SyncFailed(_) => -32004,
            Error::PageFetchFailed { .. } | Error::HttpError(_) | Error::FetchTooLarge(_) => -32005,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
