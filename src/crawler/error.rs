//! Error types for the crawler module

use crate::bilibili::{ApiError, ContentHandle};
use crate::crawler::storage::StorageError;
use thiserror::Error;

/// Per-handle failure during collection
///
/// Every variant is scoped to one handle. The collector records it and moves
/// on to the next handle.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The view endpoint rejected the handle or could not be reached
    #[error("Resolution failed for {handle}: {source}")]
    Resolution {
        handle: ContentHandle,
        source: ApiError,
    },

    /// The comment document could not be retrieved or parsed
    #[error("Fetch failed for {handle}: {source}")]
    Fetch {
        handle: ContentHandle,
        source: ApiError,
    },

    /// An existing cache record could not be read
    #[error("Cache record for {handle} is unreadable: {source}")]
    CacheRead {
        handle: ContentHandle,
        source: StorageError,
    },

    /// A freshly fetched record could not be persisted
    #[error("Failed to persist cache record for {handle}: {source}")]
    CacheWrite {
        handle: ContentHandle,
        source: StorageError,
    },
}

impl CrawlError {
    /// Handle the failure belongs to
    pub fn handle(&self) -> &ContentHandle {
        match self {
            CrawlError::Resolution { handle, .. }
            | CrawlError::Fetch { handle, .. }
            | CrawlError::CacheRead { handle, .. }
            | CrawlError::CacheWrite { handle, .. } => handle,
        }
    }
}
