//! Crawler coordinator - traversal engine
//!
//! This module drives a crawl from a single seed URL:
//! - Validating the seed and building the shared components
//! - Draining the frontier queue with a bounded pool of worker tasks
//! - Walking every task through depth, scope, claim, rate-limit, fetch and
//!   extraction stages
//! - Queueing one child task per in-scope link
//! - Detecting completion and closing the output streams

use crate::config::{validate, Config};
use crate::crawler::parser::{extract_links, read_body, Links};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::sink::{self, CrawlOutput, CrawlSink};
use crate::crawler::tracker::{TaskGuard, TaskTracker};
use crate::crawler::visited::VisitedSet;
use crate::crawler::Fetcher;
use crate::state::{SkipReason, TaskOutcome};
use crate::url::{parse_seed, resolve_link, same_host};
use crate::CrawlError;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// A unit of crawl work: one target at one depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub target: Url,

    /// Distance from the seed; the seed is depth 1
    pub depth: u32,
}

impl CrawlTask {
    /// Creates the task for the seed URL
    pub fn seed(target: Url) -> Self {
        Self { target, depth: 1 }
    }
}

/// A task waiting in the frontier, counted as outstanding
#[derive(Debug)]
struct Queued {
    task: CrawlTask,
    guard: TaskGuard,
}

/// Handle for cancelling pending rate-limiter waits
///
/// After [`ShutdownHandle::trigger`], every task that reaches the rate limiter
/// fails with a rate-limit error instead of fetching, so the crawl drains
/// quickly and completes normally.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub seed: String,

    /// Tasks ever scheduled, including the seed
    pub tasks_scheduled: usize,

    /// Tasks that fetched, parsed and emitted their target
    pub pages_processed: usize,

    /// Tasks that ended with an error
    pub tasks_failed: usize,

    /// Tasks that ended silently, by reason
    pub skipped: HashMap<SkipReason, usize>,

    /// Errors recorded, including malformed links on processed pages
    pub errors_recorded: usize,

    /// Results delivered to the result stream
    pub results_emitted: usize,

    /// Results discarded because the result buffer was full
    pub results_dropped: usize,

    /// Targets claimed in the visited set
    pub visited: usize,

    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Total number of silently skipped tasks
    pub fn tasks_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Number of tasks skipped for `reason`
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

/// Per-outcome task counters
#[derive(Debug, Default)]
struct OutcomeCounters {
    processed: AtomicUsize,
    failed: AtomicUsize,
    skipped: [AtomicUsize; 4],
}

impl OutcomeCounters {
    const SKIP_REASONS: [SkipReason; 4] = [
        SkipReason::DepthExceeded,
        SkipReason::OutOfScope,
        SkipReason::UnsupportedScheme,
        SkipReason::NotClaimed,
    ];

    fn record(&self, outcome: TaskOutcome) {
        let counter = match outcome {
            TaskOutcome::Processed { .. } => &self.processed,
            TaskOutcome::Failed(_) => &self.failed,
            TaskOutcome::Skipped(reason) => &self.skipped[reason as usize],
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn skipped(&self) -> HashMap<SkipReason, usize> {
        Self::SKIP_REASONS
            .iter()
            .map(|&reason| (reason, self.skipped[reason as usize].load(Ordering::Relaxed)))
            .filter(|&(_, count)| count > 0)
            .collect()
    }
}

/// State shared by the dispatcher and every worker
#[derive(Debug)]
struct Engine {
    config: Config,
    seed: Url,
    visited: VisitedSet,
    limiter: RateLimiter,
    fetcher: Fetcher,
    sink: CrawlSink,
    tracker: Arc<TaskTracker>,
    frontier: mpsc::UnboundedSender<Queued>,
    shutdown: Arc<watch::Sender<bool>>,
    outcomes: OutcomeCounters,
}

/// Main crawler structure
///
/// A crawler runs exactly one crawl. Its visited set, task counter and output
/// streams are created by [`Crawler::new`] and discarded when
/// [`Crawler::run`] returns.
#[derive(Debug)]
pub struct Crawler {
    engine: Arc<Engine>,
    frontier: mpsc::UnboundedReceiver<Queued>,
}

impl Crawler {
    /// Creates a crawler for `seed`
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed URL; must be an absolute http(s) URL with a host
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok((Crawler, CrawlOutput))` - The crawler and the receiving ends of
    ///   its result and error streams
    /// * `Err(CrawlError)` - Invalid configuration, invalid seed, or the HTTP
    ///   client could not be built. Nothing has been scheduled.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_map::config::Config;
    /// use ripple_map::crawler::Crawler;
    ///
    /// # async fn example() -> Result<(), ripple_map::CrawlError> {
    /// let (crawler, output) = Crawler::new("https://example.com/", Config::default())?;
    /// let summary = crawler.run().await;
    /// let (results, errors) = output.collect().await;
    /// println!("{} pages, {} errors", results.len(), errors.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(seed: &str, config: Config) -> Result<(Self, CrawlOutput), CrawlError> {
        validate(&config)?;
        let seed = parse_seed(seed)?;
        let fetcher = Fetcher::new(&config.http, &seed)?;

        let (sink, output) = sink::channel(config.crawler.result_capacity());
        let (frontier_tx, frontier_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        let engine = Engine {
            visited: VisitedSet::new(config.crawler.max_visited),
            limiter: RateLimiter::from_config(&config.rate_limit),
            fetcher,
            sink,
            tracker: TaskTracker::new(),
            frontier: frontier_tx,
            shutdown: Arc::new(shutdown_tx),
            outcomes: OutcomeCounters::default(),
            seed,
            config,
        };

        let crawler = Self {
            engine: Arc::new(engine),
            frontier: frontier_rx,
        };
        Ok((crawler, output))
    }

    /// The validated seed URL
    pub fn seed(&self) -> &Url {
        &self.engine.seed
    }

    /// Returns a handle that cancels pending rate-limiter waits
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.engine.shutdown),
        }
    }

    /// Runs the crawl to completion
    ///
    /// The seed task is queued, then the frontier is drained with at most
    /// `workers` tasks running at once. The crawl ends when no task is queued
    /// or running; all workers are joined and the output streams are closed
    /// before this returns.
    pub async fn run(self) -> CrawlSummary {
        let Crawler {
            engine,
            mut frontier,
        } = self;
        let started = Instant::now();
        let workers = engine.config.crawler.workers;

        tracing::info!(
            seed = %engine.seed,
            max_depth = engine.config.crawler.max_depth,
            max_visited = engine.visited.capacity(),
            workers,
            "Starting crawl"
        );

        engine.schedule(CrawlTask::seed(engine.seed.clone()));

        let slots = Arc::new(Semaphore::new(workers));
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                Some(joined) = running.join_next() => {
                    if let Err(e) = joined {
                        tracing::error!("Crawl task panicked: {}", e);
                    }
                }

                Some(queued) = frontier.recv() => {
                    let permit = match Arc::clone(&slots).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let engine = Arc::clone(&engine);
                    running.spawn(async move {
                        let Queued { task, guard } = queued;
                        engine.process(task).await;
                        drop(permit);
                        drop(guard);
                    });
                }

                _ = engine.tracker.wait_idle() => break,
            }
        }

        while let Some(joined) = running.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl task panicked: {}", e);
            }
        }

        let summary = CrawlSummary {
            seed: engine.seed.to_string(),
            tasks_scheduled: engine.tracker.scheduled(),
            pages_processed: engine.outcomes.processed.load(Ordering::Relaxed),
            tasks_failed: engine.outcomes.failed.load(Ordering::Relaxed),
            skipped: engine.outcomes.skipped(),
            errors_recorded: engine.sink.errors_recorded(),
            results_emitted: engine.sink.results_emitted(),
            results_dropped: engine.sink.results_dropped(),
            visited: engine.visited.len(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            pages = summary.pages_processed,
            failed = summary.tasks_failed,
            skipped = summary.tasks_skipped(),
            "Crawl completed in {:?}",
            summary.elapsed
        );

        // Dropping the engine closes the result and error streams
        drop(frontier);
        drop(engine);

        summary
    }
}

impl Engine {
    /// Counts a task as outstanding and queues it
    fn schedule(&self, task: CrawlTask) -> bool {
        let guard = self.tracker.begin();
        self.frontier.send(Queued { task, guard }).is_ok()
    }

    /// Runs one task and records its outcome
    async fn process(&self, task: CrawlTask) -> TaskOutcome {
        let outcome = match self.visit(&task).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::debug!(url = %task.target, depth = task.depth, "Task failed: {}", error);
                let stage = error.stage();
                self.sink.record_error(error);
                TaskOutcome::Failed(stage)
            }
        };

        tracing::trace!(
            url = %task.target,
            depth = task.depth,
            stage = %outcome.stage(),
            claimed = outcome.stage().is_claimed(),
            ?outcome,
            "Task finished"
        );

        self.outcomes.record(outcome);
        outcome
    }

    /// Walks a task through its stages
    ///
    /// Skips return `Ok(TaskOutcome::Skipped)`; failures return the error to
    /// record.
    async fn visit(&self, task: &CrawlTask) -> Result<TaskOutcome, CrawlError> {
        let max_depth = self.config.crawler.max_depth;

        if task.depth > max_depth {
            return Ok(TaskOutcome::Skipped(SkipReason::DepthExceeded));
        }

        if !same_host(&task.target, &self.seed) {
            return Ok(TaskOutcome::Skipped(SkipReason::OutOfScope));
        }

        if !matches!(task.target.scheme(), "http" | "https") {
            return Ok(TaskOutcome::Skipped(SkipReason::UnsupportedScheme));
        }

        let url = task.target.as_str();
        if !self.visited.claim(url) {
            return Ok(TaskOutcome::Skipped(SkipReason::NotClaimed));
        }

        self.limiter
            .acquire_until(self.cancelled())
            .await
            .map_err(|source| CrawlError::RateLimit {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!(url, depth = task.depth, "Fetching");
        let page = self.fetcher.fetch(&task.target).await?;

        let status = page.status();
        if status != StatusCode::OK {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }

        let base = page.final_url().clone();
        let markup = read_body(
            page.into_response().bytes_stream(),
            self.config.http.max_body_bytes,
        )
        .await
        .map_err(|message| CrawlError::Markup {
            url: url.to_string(),
            message,
        })?;
        let links = extract_links(&markup);

        self.sink.emit_result(url);

        let children = self.spawn_children(task, &base, links);
        tracing::debug!(url, depth = task.depth, children, "Processed");

        Ok(TaskOutcome::Processed { children })
    }

    /// Queues one child task per in-scope link found on a page
    ///
    /// Pages on the last depth level queue nothing and report nothing.
    /// Otherwise malformed links are recorded as parse errors without failing
    /// the parent. Returns the number of children queued.
    fn spawn_children(&self, parent: &CrawlTask, base: &Url, links: Links) -> usize {
        let depth = parent.depth + 1;
        if depth > self.config.crawler.max_depth {
            return 0;
        }

        let mut spawned = 0;

        for href in links {
            let target = match resolve_link(&href, base) {
                Ok(Some(target)) => target,
                Ok(None) => continue,
                Err(source) => {
                    self.sink.record_error(CrawlError::Parse {
                        input: href,
                        source,
                    });
                    continue;
                }
            };

            if !same_host(&target, &self.seed) {
                continue;
            }

            if self.schedule(CrawlTask { target, depth }) {
                spawned += 1;
            }
        }

        spawned
    }

    /// Completes once the shutdown handle has been triggered
    fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            let closed = rx.wait_for(|triggered| *triggered).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        }
    }
}
