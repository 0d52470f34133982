//! Keyword-driven paginated discovery of content handles
//!
//! Walks the search endpoint page by page until enough unique handles have
//! been seen, or until the platform signals that it is time to stop. Every
//! stopping condition is a normal result: discovery hands back whatever it
//! accumulated together with the reason it stopped.

use std::collections::HashSet;
use std::fmt;

use tracing::{info, instrument, warn};

use crate::bilibili::{ApiClient, ApiError, ContentHandle};
use crate::config::HarvestConfig;
use crate::crawler::pacing::Pacer;
use crate::http::Transport;

/// Why discovery stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStop {
    /// The target number of handles was collected
    TargetReached,

    /// A page came back without results
    Exhausted,

    /// The platform answered with its anti-crawl or too-many-requests signal
    RateLimited,

    /// The body was not the expected JSON, usually a captcha page
    Malformed(String),

    /// The embedded status code reported an error
    ApiError { code: i64, message: String },

    /// Any other non-success transport status
    HttpStatus(u16),

    /// The request never completed
    Transport(String),

    /// The page ceiling was hit
    PageCeiling,

    /// The configured search endpoint is not a usable URL
    InvalidEndpoint(String),
}

impl DiscoveryStop {
    fn from_api_error(err: ApiError) -> Self {
        if err.is_rate_limited() {
            return DiscoveryStop::RateLimited;
        }
        match err {
            ApiError::Status(status) => DiscoveryStop::HttpStatus(status),
            ApiError::Application { code, message } => DiscoveryStop::ApiError { code, message },
            ApiError::Transport(e) => DiscoveryStop::Transport(e.to_string()),
            ApiError::Url(e) => DiscoveryStop::InvalidEndpoint(e.to_string()),
            other => DiscoveryStop::Malformed(other.to_string()),
        }
    }

    /// Whether discovery ended early instead of running out of work
    pub fn is_interruption(&self) -> bool {
        !matches!(
            self,
            DiscoveryStop::TargetReached | DiscoveryStop::Exhausted | DiscoveryStop::PageCeiling
        )
    }
}

impl fmt::Display for DiscoveryStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStop::TargetReached => write!(f, "target count reached"),
            DiscoveryStop::Exhausted => write!(f, "no more search results"),
            DiscoveryStop::RateLimited => {
                write!(f, "anti-crawl response received, try again later or from another network")
            }
            DiscoveryStop::Malformed(reason) => {
                write!(f, "response was not valid JSON, likely throttled ({reason})")
            }
            DiscoveryStop::ApiError { code, message } => {
                write!(f, "search API reported {code}: {message}")
            }
            DiscoveryStop::HttpStatus(status) => write!(f, "unexpected HTTP status {status}"),
            DiscoveryStop::Transport(reason) => write!(f, "request failed: {reason}"),
            DiscoveryStop::PageCeiling => write!(f, "page ceiling reached"),
            DiscoveryStop::InvalidEndpoint(reason) => {
                write!(f, "search endpoint is not a valid URL ({reason})")
            }
        }
    }
}

/// Result of a discovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Unique handles in discovery order
    pub handles: Vec<ContentHandle>,

    /// Number of search requests issued
    pub pages_fetched: u32,

    /// Reason the run ended
    pub stop: DiscoveryStop,
}

/// Discover up to `config.target_count` unique handles for `keyword`
///
/// # Arguments
///
/// * `client` - The API client
/// * `pacer` - Waits between consecutive search pages
/// * `keyword` - Free-text search keyword
/// * `config` - Supplies the target count and the page ceiling
///
/// # Returns
///
/// The handles found so far and why discovery stopped. Never fails.
#[instrument(skip(client, pacer, config))]
pub async fn discover<T, P>(
    client: &ApiClient<T>,
    pacer: &P,
    keyword: &str,
    config: &HarvestConfig,
) -> Discovery
where
    T: Transport,
    P: Pacer,
{
    let target = config.target_count;
    let mut handles: Vec<ContentHandle> = Vec::new();
    let mut seen: HashSet<ContentHandle> = HashSet::new();
    let mut pages_fetched = 0u32;
    let mut page = 1u32;

    let stop = loop {
        if handles.len() >= target {
            break DiscoveryStop::TargetReached;
        }
        if page > config.max_pages {
            break DiscoveryStop::PageCeiling;
        }

        let result = client.search_page(keyword, page).await;
        pages_fetched += 1;

        let page_handles = match result {
            Ok(search_page) => search_page.handles,
            Err(err) => {
                let stop = DiscoveryStop::from_api_error(err);
                warn!("Stopping discovery on page {}: {}", page, stop);
                break stop;
            }
        };

        if page_handles.is_empty() {
            break DiscoveryStop::Exhausted;
        }

        for handle in page_handles {
            if handles.len() >= target {
                break;
            }
            if seen.insert(handle.clone()) {
                handles.push(handle);
            }
        }
        info!("Fetched page {}, {} handles so far", page, handles.len());

        if handles.len() >= target {
            break DiscoveryStop::TargetReached;
        }

        page += 1;
        if page > config.max_pages {
            break DiscoveryStop::PageCeiling;
        }
        pacer.pause().await;
    };

    info!(
        "Discovery finished with {} handles after {} pages: {}",
        handles.len(),
        pages_fetched,
        stop
    );

    Discovery {
        handles,
        pages_fetched,
        stop,
    }
}
