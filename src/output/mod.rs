//! Output module for reporting crawl results
//!
//! This module handles:
//! - Writing result URLs, one per line
//! - Writing the aggregated error report
//! - Summarizing crawl statistics

pub mod stats;

pub use stats::{print_statistics, write_statistics, CrawlStatistics};

use crate::CrawlError;
use std::io::{self, Write};

/// Writes one result URL per line
pub fn write_result<W: Write>(writer: &mut W, url: &str) -> io::Result<()> {
    writeln!(writer, "{}", url)
}

/// Writes the aggregated error report
///
/// Nothing is written when `errors` is empty. Otherwise the report is a blank
/// line, an `Aggregated Errors:` header, and one line per error.
///
/// # Arguments
///
/// * `writer` - Destination, usually stderr
/// * `errors` - Errors drained from the crawl's error stream
pub fn write_errors<W: Write>(writer: &mut W, errors: &[CrawlError]) -> io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    writeln!(writer, "Aggregated Errors:")?;
    for error in errors {
        writeln!(writer, "{}", error)?;
    }
    writer.flush()
}
