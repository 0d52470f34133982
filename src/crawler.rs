//! # Danmaku Crawler Module
//!
//! This module implements the crawl-and-cache half of a harvest run: finding
//! videos for a keyword and gathering their danmaku into a corpus, with an
//! on-disk record per video so later runs skip work already done.
//!
//! ## Key Components
//!
//! - `discover`: paginated keyword search with graceful early termination
//! - `collect`: per-handle cache check, fetch, normalization and persistence
//! - `normalize`: whitespace removal applied to every stored entry
//! - `Storage` / `RecordStore`: XML cache records keyed by discovery index and handle
//! - `Pacer`: randomized courtesy pauses between requests
//!
//! ## Failure model
//!
//! Nothing in this module aborts a run. Discovery returns what it has when the
//! platform pushes back, and a failing handle contributes zero entries while
//! the rest of the handles are still processed.

mod collector;
mod discovery;
mod error;
mod normalize;
pub mod pacing;
pub mod storage;

pub use collector::{
    CollectProgress, CollectStep, Collection, ItemOutcome, ItemReport, ItemStatus, collect,
    plan_collection, record_keys,
};
pub use discovery::{Discovery, DiscoveryStop, discover};
pub use error::CrawlError;
pub use normalize::normalize;
pub use pacing::{NoPause, Pacer, RandomPacer};
pub use storage::{MemoryStore, RecordKey, RecordStore, Storage, StorageConfig, StorageError};
