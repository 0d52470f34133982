//! Error types for the danmaku crate

use thiserror::Error;

/// Result type for danmaku operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for danmaku operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
