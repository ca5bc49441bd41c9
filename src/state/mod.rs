//! State module for tracking crawl task progress
//!
//! # Components
//!
//! - `TaskStage`: The stages a crawl task moves through, from start to done
//! - `SkipReason`: Why a task ended silently without a result or an error
//! - `TaskOutcome`: How a finished task ended

mod task_state;

// Re-export main types
pub use task_state::{SkipReason, TaskOutcome, TaskStage};
