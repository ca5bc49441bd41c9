//! Token bucket rate limiter for outbound fetches
//!
//! One limiter is shared by every crawl task. Callers reserve a token up
//! front: if the bucket is empty the token is borrowed against future refills
//! and the caller sleeps until it has been earned. Cancelling a wait hands the
//! borrowed token back.

use crate::config::RateLimitConfig;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors returned by [`RateLimiter::acquire_until`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("wait cancelled")]
    Cancelled,
}

/// Mutable bucket state, guarded by the limiter's mutex
#[derive(Debug)]
struct Bucket {
    /// Available tokens; negative while tokens are borrowed by waiters
    tokens: f64,

    /// When `tokens` was last brought up to date
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, rate: f64, burst: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * rate).min(burst);
        self.last_refill = now;
    }
}

/// Token bucket with a steady refill rate and a fixed burst size
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,

    /// Tokens added per second
    rate: f64,

    /// Bucket capacity
    burst: f64,
}

impl RateLimiter {
    /// Creates a limiter with a full bucket
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Steady refill rate; must be positive
    /// * `burst` - Bucket size; must be at least 1
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
            rate: requests_per_second,
            burst,
        }
    }

    /// Creates a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst)
    }

    /// Waits until a token is available
    pub async fn acquire(&self) {
        let delay = self.reserve();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Waits until a token is available or `cancel` completes
    ///
    /// Cancellation takes priority: if `cancel` is already complete the call
    /// fails even when a token is immediately available.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - A token was taken
    /// * `Err(RateLimitError::Cancelled)` - The wait was cancelled; no token
    ///   was consumed
    pub async fn acquire_until<F>(&self, cancel: F) -> Result<(), RateLimitError>
    where
        F: Future<Output = ()>,
    {
        let delay = self.reserve();

        tokio::select! {
            biased;
            _ = cancel => {
                self.release();
                Err(RateLimitError::Cancelled)
            }
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Takes one token and returns how long the caller must wait for it
    fn reserve(&self) -> Duration {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.refill(Instant::now(), self.rate, self.burst);
        bucket.tokens -= 1.0;

        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / self.rate)
        }
    }

    /// Returns a reserved token to the bucket
    fn release(&self) {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.tokens = (bucket.tokens + 1.0).min(self.burst);
    }

    /// Returns the steady refill rate in tokens per second
    pub fn rate(&self) -> f64 {
        self.rate
    }
}
