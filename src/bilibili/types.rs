//! Wire and domain types for the platform API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a discoverable video (a `bvid`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHandle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

/// Stream identifier and title resolved from a handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    /// Internal stream identifier (`cid`) addressing the comment document
    pub stream_id: u64,

    /// Display title of the video
    pub title: String,
}

/// Common response envelope of the JSON endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Application-level status, 0 on success
    pub code: i64,

    /// Human readable status message
    #[serde(default)]
    pub message: String,

    /// Payload, absent on most failures
    pub data: Option<T>,
}

/// Payload of the view endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ViewData {
    pub cid: u64,

    #[serde(default)]
    pub title: String,
}

impl From<ViewData> for ResolvedStream {
    fn from(data: ViewData) -> Self {
        ResolvedStream {
            stream_id: data.cid,
            title: data.title,
        }
    }
}

/// Payload of the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    /// Absent or `null` when the page has no hits
    #[serde(default)]
    pub result: Option<Vec<SearchItem>>,
}

/// One search hit
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub bvid: Option<String>,
}
