//! Result and error streams of a crawl
//!
//! Results travel over a bounded channel and are never allowed to block a
//! crawl task: when the buffer is full the result is dropped, logged, and
//! counted. Errors travel over an unbounded channel so none are lost. Both
//! channels close when the crawler that owns the sending half is dropped at
//! the end of [`Crawler::run`](crate::crawler::Crawler::run).

use crate::CrawlError;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Sending half, shared by all crawl tasks
#[derive(Debug)]
pub struct CrawlSink {
    results: mpsc::Sender<String>,
    errors: mpsc::UnboundedSender<CrawlError>,
    emitted: AtomicUsize,
    dropped: AtomicUsize,
    recorded: AtomicUsize,
}

/// Receiving half, drained by the caller
#[derive(Debug)]
pub struct CrawlOutput {
    /// Every successfully processed URL, at most once each, in no fixed order
    pub results: mpsc::Receiver<String>,

    /// Every error recorded during the crawl, in no fixed order
    pub errors: mpsc::UnboundedReceiver<CrawlError>,
}

/// Creates a connected sink and output pair
///
/// # Arguments
///
/// * `result_capacity` - Number of results buffered before new ones are
///   dropped (at least 1)
pub fn channel(result_capacity: usize) -> (CrawlSink, CrawlOutput) {
    let (results_tx, results_rx) = mpsc::channel(result_capacity.max(1));
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();

    let sink = CrawlSink {
        results: results_tx,
        errors: errors_tx,
        emitted: AtomicUsize::new(0),
        dropped: AtomicUsize::new(0),
        recorded: AtomicUsize::new(0),
    };
    let output = CrawlOutput {
        results: results_rx,
        errors: errors_rx,
    };
    (sink, output)
}

impl CrawlSink {
    /// Pushes a processed URL onto the result stream without waiting
    ///
    /// Returns false if the result was dropped because the buffer is full or
    /// the receiver is gone.
    pub fn emit_result(&self, url: &str) -> bool {
        match self.results.try_send(url.to_string()) {
            Ok(()) => {
                self.emitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(url)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(url = %url, "result buffer full, dropping result");
                false
            }
            Err(TrySendError::Closed(url)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %url, "result receiver closed, dropping result");
                false
            }
        }
    }

    /// Pushes an error onto the error stream
    pub fn record_error(&self, error: CrawlError) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        if let Err(unsent) = self.errors.send(error) {
            tracing::debug!(error = %unsent.0, "error receiver closed");
        }
    }

    /// Number of results delivered to the result stream
    pub fn results_emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of results discarded
    pub fn results_dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of errors recorded
    pub fn errors_recorded(&self) -> usize {
        self.recorded.load(Ordering::Relaxed)
    }
}

impl CrawlOutput {
    /// Drains both streams until they close
    ///
    /// Returns once the crawl has finished and every buffered item has been
    /// read.
    pub async fn collect(mut self) -> (Vec<String>, Vec<CrawlError>) {
        let mut results = Vec::new();
        while let Some(url) = self.results.recv().await {
            results.push(url);
        }

        let mut errors = Vec::new();
        while let Some(error) = self.errors.recv().await {
            errors.push(error);
        }

        (results, errors)
    }
}
