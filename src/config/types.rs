use serde::Deserialize;
use std::time::Duration;

/// Default maximum crawl depth (the seed is depth 1)
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Default maximum number of distinct targets claimed per crawl
pub const DEFAULT_MAX_VISITED: usize = 100;

/// Main configuration structure
///
/// Every section and field has a default, so an empty TOML file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub http: HttpConfig,
}

/// Traversal limits and worker pool sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl, counting the seed as depth 1
    pub max_depth: u32,

    /// Maximum number of distinct URLs to visit
    pub max_visited: usize,

    /// Maximum number of tasks running at once
    pub workers: usize,

    /// Capacity of the result stream; defaults to `max_visited`
    pub result_buffer: Option<usize>,
}

impl CrawlerConfig {
    /// Returns the effective capacity of the result stream
    pub fn result_capacity(&self) -> usize {
        self.result_buffer.unwrap_or(self.max_visited)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_visited: DEFAULT_MAX_VISITED,
            workers: 16,
            result_buffer: None,
        }
    }
}

/// Token bucket settings shared by all fetches
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    /// Steady refill rate in tokens per second
    pub requests_per_second: f64,

    /// Bucket size
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5.0,
            burst: 1,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Redirects followed before the fetch fails
    pub max_redirects: usize,

    /// Largest body read from a single page
    pub max_body_bytes: usize,

    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 20,
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}
