//! Ripple-Map: a bounded, host-scoped site mapper
//!
//! This crate implements a concurrent web crawler that starts from a seed URL,
//! follows `<a href>` links on the seed's host up to a maximum depth and a
//! maximum number of visited pages, and reports every processed URL together
//! with every error encountered along the way.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use crate::crawler::{FetchFailure, RateLimitError};
use std::fmt;
use thiserror::Error;

/// Main error type for crawl operations
///
/// Task-level variants (`Parse`, `Fetch`, `Status`, `Markup`, `RateLimit`) are
/// recorded on the error stream and only end the task that produced them.
/// The remaining variants abort the run before any task is scheduled.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("error parsing URL {input}: {source}")]
    Parse {
        input: String,
        source: ::url::ParseError,
    },

    #[error("error fetching {url} ({kind}): {source}")]
    Fetch {
        url: String,
        kind: FetchFailure,
        source: reqwest::Error,
    },

    #[error("non-OK status for {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("error parsing {url}: {message}")]
    Markup { url: String, message: String },

    #[error("rate limit error for {url}: {source}")]
    RateLimit {
        url: String,
        source: RateLimitError,
    },

    #[error("invalid seed URL: {0}")]
    Url(#[from] UrlError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CrawlError {
    /// Returns the stage of the crawl pipeline that produced this error
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::Parse { .. } => ErrorStage::Parse,
            Self::Fetch { .. } => ErrorStage::Fetch,
            Self::Status { .. } => ErrorStage::Status,
            Self::Markup { .. } => ErrorStage::Markup,
            Self::RateLimit { .. } => ErrorStage::RateLimit,
            Self::Url(_) | Self::Client(_) | Self::Config(_) => ErrorStage::Setup,
        }
    }

    /// Returns the crawl target (or raw link input) this error is about, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Parse { input, .. } => Some(input),
            Self::Fetch { url, .. }
            | Self::Status { url, .. }
            | Self::Markup { url, .. }
            | Self::RateLimit { url, .. } => Some(url),
            Self::Url(_) | Self::Client(_) | Self::Config(_) => None,
        }
    }

    /// Returns true if this error aborts the whole run rather than a single task
    pub fn is_fatal(&self) -> bool {
        self.stage() == ErrorStage::Setup
    }
}

/// Pipeline stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorStage {
    /// Malformed seed or link reference
    Parse,
    /// Network failure, timeout or redirect limit
    Fetch,
    /// Response status other than 200 OK
    Status,
    /// Body could not be read or parsed
    Markup,
    /// Rate limiter wait was cancelled
    RateLimit,
    /// Seed validation or crawler construction
    Setup,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse",
            Self::Fetch => "fetch",
            Self::Status => "status",
            Self::Markup => "markup",
            Self::RateLimit => "rate-limit",
            Self::Setup => "setup",
        };
        f.write_str(name)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL {input}: {source}")]
    Parse {
        input: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutput, CrawlSummary, Crawler};
pub use state::{SkipReason, TaskStage};
pub use url::{parse_seed, resolve_link, same_host};
