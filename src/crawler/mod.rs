//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed client configuration
//! - Body reading and anchor extraction
//! - Rate limiting and per-target claiming
//! - Overall crawl coordination and completion tracking

mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;
mod sink;
mod tracker;
mod visited;

pub use coordinator::{CrawlSummary, CrawlTask, Crawler, ShutdownHandle};
pub use fetcher::{FetchFailure, FetchedPage, Fetcher};
pub use parser::{extract_links, read_body, Links};
pub use rate_limiter::{RateLimitError, RateLimiter};
pub use sink::{channel, CrawlOutput, CrawlSink};
pub use tracker::{TaskGuard, TaskTracker};
pub use visited::VisitedSet;

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl and collects everything it produced
///
/// This is the simplest entry point. It will:
/// 1. Validate the configuration and the seed
/// 2. Build the crawler and its output streams
/// 3. Run the crawl to completion
/// 4. Drain the result and error streams
///
/// Results are buffered up to the configured result capacity while the crawl
/// runs; use [`Crawler`] directly to consume them as they arrive.
///
/// # Arguments
///
/// * `seed` - The seed URL
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok((summary, results, errors))` - The crawl ran; task-level errors are
///   in `errors`
/// * `Err(CrawlError)` - The crawl could not start
pub async fn crawl(
    seed: &str,
    config: Config,
) -> Result<(CrawlSummary, Vec<String>, Vec<CrawlError>), CrawlError> {
    let (crawler, output) = Crawler::new(seed, config)?;
    let summary = crawler.run().await;
    let (results, errors) = output.collect().await;
    Ok((summary, results, errors))
}
