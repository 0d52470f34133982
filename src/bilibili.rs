//! Bilibili platform API
//!
//! Thin client over the three endpoints the harvester uses: keyword search,
//! handle resolution (`bvid` to `cid` and title) and the per-stream danmaku
//! XML document.

mod client;
mod document;
mod error;
mod types;

pub use client::{ApiClient, SearchPage};
pub use document::CommentDocument;
pub use error::ApiError;
pub use types::{ContentHandle, Envelope, ResolvedStream, SearchData, SearchItem, ViewData};

/// Embedded status code the platform uses for anti-crawl rejections
pub const ANTI_CRAWL_CODE: i64 = -412;
