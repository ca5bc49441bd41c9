//! Ripple-Map main entry point
//!
//! This is the command-line interface for the Ripple-Map site mapper.

use anyhow::Context;
use clap::Parser;
use ripple_map::config::{load_config, validate, Config, DEFAULT_MAX_DEPTH, DEFAULT_MAX_VISITED};
use ripple_map::crawler::Crawler;
use ripple_map::output::{print_statistics, write_errors, write_result, CrawlStatistics};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Ripple-Map: a bounded, host-scoped site mapper
///
/// Ripple-Map crawls the pages of a single host starting from a seed URL,
/// following links up to a maximum depth and a maximum number of pages. Every
/// processed URL is printed to stdout; errors are reported on stderr once the
/// crawl completes.
#[derive(Parser, Debug)]
#[command(name = "ripple-map")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, host-scoped site mapper", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum crawl depth; the seed is depth 1 [default: 2]
    #[arg(value_name = "MAX_DEPTH")]
    max_depth: Option<String>,

    /// Maximum number of pages to visit [default: 100]
    #[arg(value_name = "MAX_VISITED")]
    max_visited: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages processed at once
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("ripple_map=info,warn"),
            2 => EnvFilter::new("ripple_map=debug,info"),
            _ => EnvFilter::new("ripple_map=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configuration from the optional file and the command line
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(raw) = &cli.max_depth {
        config.crawler.max_depth = positional(raw, "max depth", DEFAULT_MAX_DEPTH);
    }
    if let Some(raw) = &cli.max_visited {
        config.crawler.max_visited = positional(raw, "max visited", DEFAULT_MAX_VISITED);
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Parses a positional limit, falling back to `default` when it is not a
/// positive integer
///
/// Zero falls back as well; the seed is depth 1, so the smallest usable depth
/// is 1.
fn positional<T>(raw: &str, name: &str, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!(
                "Ignoring {} {:?}: expected a positive integer (0 is not allowed), using {}",
                name,
                raw,
                default
            );
            default
        }
    }
}

/// Runs the crawl and prints its output
async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;
    let (crawler, mut output) = Crawler::new(&cli.url, config)?;

    // Ctrl-C cancels pending rate-limit waits; the crawl then drains normally
    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, shutting down");
            shutdown.trigger();
        }
    });

    // Print results as they arrive
    let printer = tokio::spawn(async move {
        let stdout = io::stdout();
        while let Some(url) = output.results.recv().await {
            let mut out = stdout.lock();
            if let Err(e) = write_result(&mut out, &url).and_then(|_| out.flush()) {
                tracing::error!("Failed to write result: {}", e);
            }
        }
        output.errors
    });

    let summary = crawler.run().await;

    let mut error_stream = printer.await.context("result printer failed")?;
    let mut errors = Vec::new();
    while let Some(error) = error_stream.recv().await {
        errors.push(error);
    }

    write_errors(&mut io::stderr().lock(), &errors).context("failed to write errors")?;

    if cli.verbose > 0 {
        print_statistics(&CrawlStatistics::new(&summary, &errors));
    }

    Ok(ExitCode::SUCCESS)
}
