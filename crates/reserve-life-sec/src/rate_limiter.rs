//! Request spacing for SEC endpoints
//!
//! SEC allows 10 requests per second. The limiter serializes callers and
//! keeps the start of consecutive requests at least `min_interval` apart.

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Serializing rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

/// Held for the duration of one request; the next caller waits for it
#[derive(Debug)]
pub struct RateLimitPermit<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with a minimum spacing between requests
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Create a limiter allowing `requests` per second
    pub fn per_second(requests: u32) -> Self {
        Self::new(Duration::from_millis(1000 / u64::from(requests.max(1))))
    }

    /// Wait for this caller's turn
    pub async fn acquire(&self) -> RateLimitPermit<'_> {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
        RateLimitPermit { _guard: last }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(10)
    }
}
