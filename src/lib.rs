//! # danmaku - Keyword-driven danmaku harvesting for Bilibili
//!
//! This crate gathers the scrolling comments ("danmaku") attached to the videos
//! a Bilibili keyword search returns, keeps a local record per video so a run
//! can be resumed without re-downloading, and summarizes the result as a
//! frequency table and a word cloud.
//!
//! ## Features
//!
//! - Paginated keyword discovery that stops cleanly on anti-crawl responses
//! - Per-video XML cache records; existing records are never re-fetched
//! - Whitespace-normalized comment corpus in discovery order
//! - Top-k frequency summary with stable tie ordering
//! - Word cloud rendering with fontdue and image
//! - Injected transport, storage, pacing and rendering for offline testing
//!
//! ## Example
//!
//! ```rust,no_run
//! use danmaku::config::HarvestConfig;
//! use danmaku::pipeline::Harvester;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::builder().target_count(60).build();
//!     let harvester = Harvester::from_config(config)?;
//!
//!     let summary = harvester.run("大模型", None).await?;
//!     println!(
//!         "{} videos, {} entries",
//!         summary.discovery.handles.len(),
//!         summary.total_entries()
//!     );
//!     Ok(())
//! }
//! ```

mod error;

pub mod bilibili;
pub mod config;
pub mod crawler;
pub mod http;
pub mod pipeline;
pub mod report;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
