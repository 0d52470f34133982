//! # Harvest Configuration Module
//!
//! Configuration for a harvest run: request headers, platform endpoints,
//! discovery limits, pacing and output locations. The configuration is an
//! explicit value passed to every component; nothing is read from process
//! state once the value is built.
//!
//! ## Key Components
//!
//! - `HarvestConfig`: the full configuration for one run
//! - `HarvestConfigBuilder`: builder for overriding individual settings
//! - `RequestHeaders`: static headers sent with every request
//! - `Endpoints`: base URLs of the search, view and comment endpoints

use std::path::PathBuf;
use std::time::Duration;

/// Default number of handles discovery tries to collect
pub const DEFAULT_TARGET_COUNT: usize = 360;

/// Hard ceiling on the number of search pages visited
pub const DEFAULT_MAX_PAGES: u32 = 30;

/// Number of rows in the summary report
pub const DEFAULT_TOP_K: usize = 8;

/// Static headers sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub user_agent: String,
    pub referer: String,
    pub origin: String,
    pub accept: String,
    pub accept_language: String,
    pub cookie: String,
}

impl Default for RequestHeaders {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referer: "https://search.bilibili.com/".to_string(),
            origin: "https://search.bilibili.com".to_string(),
            accept: "application/json, text/plain, */*".to_string(),
            accept_language: "zh-CN,zh;q=0.9".to_string(),
            cookie: "buvid3=12345678-FakeCookie; CURRENT_FNVAL=4048;".to_string(),
        }
    }
}

impl RequestHeaders {
    /// Header name/value pairs in the order they are sent
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("User-Agent", self.user_agent.as_str()),
            ("Referer", self.referer.as_str()),
            ("Origin", self.origin.as_str()),
            ("Accept", self.accept.as_str()),
            ("Accept-Language", self.accept_language.as_str()),
            ("Cookie", self.cookie.as_str()),
        ]
    }
}

/// Platform endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Paginated keyword search
    pub search_url: String,

    /// Handle to stream identifier lookup
    pub view_url: String,

    /// Base URL of the per-stream comment documents
    pub comment_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_url: "https://api.bilibili.com/x/web-interface/search/type".to_string(),
            view_url: "https://api.bilibili.com/x/web-interface/view".to_string(),
            comment_base_url: "https://comment.bilibili.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at a single host, used against local test servers
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            search_url: format!("{base}/x/web-interface/search/type"),
            view_url: format!("{base}/x/web-interface/view"),
            comment_base_url: base.to_string(),
        }
    }
}

/// Configuration for a harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Headers sent with every request
    pub headers: RequestHeaders,

    /// Endpoints queried by the API client
    pub endpoints: Endpoints,

    /// Maximum number of handles to discover
    pub target_count: usize,

    /// Maximum number of search pages to visit
    pub max_pages: u32,

    /// Lower bound of the courtesy pause in milliseconds
    pub min_delay_ms: u64,

    /// Upper bound of the courtesy pause in milliseconds
    pub max_delay_ms: u64,

    /// Directory holding per-video cache records
    pub cache_dir: PathBuf,

    /// Directory receiving the summary report and rendered image
    pub output_dir: PathBuf,

    /// Number of rows in the summary report
    pub top_k: usize,

    /// Font used by the word cloud renderer
    pub font_path: Option<PathBuf>,

    /// Whether to render the word cloud at all
    pub render: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            headers: RequestHeaders::default(),
            endpoints: Endpoints::default(),
            target_count: DEFAULT_TARGET_COUNT,
            max_pages: DEFAULT_MAX_PAGES,
            min_delay_ms: 400,
            max_delay_ms: 800,
            cache_dir: PathBuf::from("danmaku_data"),
            output_dir: PathBuf::from("."),
            top_k: DEFAULT_TOP_K,
            font_path: None,
            render: true,
        }
    }
}

/// Builder for HarvestConfig
#[derive(Debug, Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }

    pub fn headers(mut self, headers: RequestHeaders) -> Self {
        self.config.headers = headers;
        self
    }

    /// Replace the cookie header, leaving the other headers untouched
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.config.headers.cookie = cookie.into();
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Set the maximum number of handles to discover
    pub fn target_count(mut self, target_count: usize) -> Self {
        self.config.target_count = target_count;
        self
    }

    /// Set the search page ceiling
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the courtesy pause range in milliseconds
    pub fn delay_ms(mut self, min: u64, max: u64) -> Self {
        self.config.min_delay_ms = min.min(max);
        self.config.max_delay_ms = max.max(min);
        self
    }

    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = cache_dir.into();
        self
    }

    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    pub fn font_path(mut self, font_path: Option<PathBuf>) -> Self {
        self.config.font_path = font_path;
        self
    }

    pub fn render(mut self, render: bool) -> Self {
        self.config.render = render;
        self
    }

    /// Build the configuration
    pub fn build(self) -> HarvestConfig {
        self.config
    }
}

impl HarvestConfig {
    /// Create a new builder
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::new()
    }

    /// Bounds of the courtesy pause
    pub fn delay_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}
