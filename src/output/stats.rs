//! Statistics for a finished crawl
//!
//! This module turns a crawl summary and its drained errors into counts by
//! outcome and by error stage, and prints them.

use crate::crawler::CrawlSummary;
use crate::{CrawlError, ErrorStage, SkipReason};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Seed URL of the crawl
    pub seed: String,

    /// Total number of tasks scheduled, including the seed
    pub tasks_scheduled: usize,

    /// Number of pages fetched and emitted
    pub pages_processed: usize,

    /// Number of tasks that ended with an error
    pub tasks_failed: usize,

    /// Count of silently skipped tasks by reason
    pub skipped: HashMap<SkipReason, usize>,

    /// Count of errors by stage
    pub errors_by_stage: HashMap<ErrorStage, usize>,

    /// Results discarded because the result buffer was full
    pub results_dropped: usize,

    /// Number of targets claimed in the visited set
    pub visited: usize,

    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Builds statistics from a crawl summary and the errors it produced
    pub fn new(summary: &CrawlSummary, errors: &[CrawlError]) -> Self {
        let mut errors_by_stage = HashMap::new();
        for error in errors {
            *errors_by_stage.entry(error.stage()).or_insert(0) += 1;
        }

        Self {
            seed: summary.seed.clone(),
            tasks_scheduled: summary.tasks_scheduled,
            pages_processed: summary.pages_processed,
            tasks_failed: summary.tasks_failed,
            skipped: summary.skipped.clone(),
            errors_by_stage,
            results_dropped: summary.results_dropped,
            visited: summary.visited,
            elapsed: summary.elapsed,
        }
    }

    /// Total number of errors recorded
    pub fn total_errors(&self) -> usize {
        self.errors_by_stage.values().sum()
    }

    /// Share of claimed targets that were processed, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.visited > 0 {
            (self.pages_processed as f64 / self.visited as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Writes statistics in a formatted manner
///
/// # Arguments
///
/// * `writer` - Destination for the report
/// * `stats` - The statistics to display
pub fn write_statistics<W: Write>(writer: &mut W, stats: &CrawlStatistics) -> io::Result<()> {
    writeln!(writer, "=== Crawl Statistics ===\n")?;

    writeln!(writer, "Overview:")?;
    writeln!(writer, "  Seed: {}", stats.seed)?;
    writeln!(writer, "  Tasks scheduled: {}", stats.tasks_scheduled)?;
    writeln!(writer, "  Targets visited: {}", stats.visited)?;
    writeln!(writer, "  Pages processed: {}", stats.pages_processed)?;
    writeln!(writer, "  Tasks failed: {}", stats.tasks_failed)?;
    writeln!(writer, "  Elapsed: {:.2}s", stats.elapsed.as_secs_f64())?;
    writeln!(writer)?;

    if !stats.skipped.is_empty() {
        writeln!(writer, "Skipped Tasks:")?;
        // Sort reasons by count (descending)
        let mut skip_counts: Vec<_> = stats.skipped.iter().collect();
        skip_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.stage().cmp(&b.0.stage())));

        for (reason, count) in skip_counts {
            writeln!(writer, "  {:?}: {}", reason, count)?;
        }
        writeln!(writer)?;
    }

    if !stats.errors_by_stage.is_empty() {
        writeln!(writer, "Error Summary:")?;
        let mut error_counts: Vec<_> = stats.errors_by_stage.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (stage, count) in error_counts {
            writeln!(writer, "  {}: {}", stage, count)?;
        }
        writeln!(writer)?;
    }

    if stats.results_dropped > 0 {
        writeln!(
            writer,
            "Results dropped (buffer full): {}",
            stats.results_dropped
        )?;
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "Success Rate: {:.1}% ({} / {} visited targets processed)",
        stats.success_rate(),
        stats.pages_processed,
        stats.visited
    )
}

/// Prints statistics to stderr
pub fn print_statistics(stats: &CrawlStatistics) {
    let stderr = io::stderr();
    if let Err(e) = write_statistics(&mut stderr.lock(), stats) {
        tracing::warn!("Failed to print statistics: {}", e);
    }
}
