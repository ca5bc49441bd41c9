//! Visited set guarding per-target exclusivity
//!
//! The set is the only membership structure shared between crawl tasks. It
//! exposes a single atomic operation, [`VisitedSet::claim`], so no caller can
//! observe "absent" and insert in two separate steps.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Bounded set of claimed crawl targets
#[derive(Debug)]
pub struct VisitedSet {
    /// Claimed targets; the lock covers the membership test, insert, and count
    claimed: Mutex<HashSet<String>>,

    /// Maximum number of targets that may ever be claimed
    cap: usize,
}

impl VisitedSet {
    /// Creates an empty set that accepts at most `cap` claims
    pub fn new(cap: usize) -> Self {
        Self {
            claimed: Mutex::new(HashSet::with_capacity(cap.min(1024))),
            cap,
        }
    }

    /// Claims a target for exclusive processing
    ///
    /// # Returns
    ///
    /// * `true` - The target was absent and the cap not yet reached; it is now
    ///   recorded and the caller is its sole processor
    /// * `false` - The target was already claimed, or the set is full. Callers
    ///   treat this as a silent skip.
    pub fn claim(&self, target: &str) -> bool {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);

        if claimed.len() >= self.cap || claimed.contains(target) {
            return false;
        }

        claimed.insert(target.to_string())
    }

    /// Returns true if the target has been claimed
    #[cfg(test)]
    pub fn contains(&self, target: &str) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(target)
    }

    /// Returns the number of claimed targets
    pub(crate) fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether nothing has been claimed yet
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured cap
    pub fn capacity(&self) -> usize {
        self.cap
    }
}
