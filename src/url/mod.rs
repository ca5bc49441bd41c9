//! URL handling module
//!
//! This module provides link resolution against a base URL, seed validation,
//! and host scoping for the crawl.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, same_host};
pub use normalize::{parse_seed, resolve_link};
