//! Outstanding-task counter and completion signal
//!
//! A task is counted from the moment it is scheduled until its [`TaskGuard`]
//! is dropped, which happens when the task finishes for any reason, including
//! a panic. The crawl is complete when the count returns to zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts scheduled-but-unfinished tasks
#[derive(Debug, Default)]
pub struct TaskTracker {
    outstanding: AtomicUsize,
    scheduled: AtomicUsize,
    idle: Notify,
}

/// Keeps one task counted as outstanding until dropped
#[derive(Debug)]
pub struct TaskGuard {
    tracker: Arc<TaskTracker>,
}

impl TaskTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Counts a new task; must be called before the task is queued
    pub fn begin(self: &Arc<Self>) -> TaskGuard {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.scheduled.fetch_add(1, Ordering::Relaxed);
        TaskGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of tasks scheduled and not yet finished
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Number of tasks ever scheduled
    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::Relaxed)
    }

    /// Waits until no task is outstanding
    pub async fn wait_idle(&self) {
        loop {
            // Register before checking so a notification between the check
            // and the await is not missed
            let notified = self.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn finish(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
