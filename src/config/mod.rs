//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings have defaults; a file only needs the values it changes.
//!
//! # Example
//!
//! ```no_run
//! use ripple_map::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, RateLimitConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_VISITED,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
