//! Fixed-interval request pacing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum gap between consecutive dispatches.
///
/// The lock is held across the wait so concurrent callers queue up and each
/// gets its own slot.
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until the next request may go out, then claim the slot.
    ///
    /// Returns the dispatch instant that was recorded.
    pub async fn wait_turn(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiter: waiting {}ms", wait.as_millis());
                sleep(wait).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        limiter.wait_turn().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_dispatches_are_spaced() {
        let interval = Duration::from_millis(120);
        let limiter = RateLimiter::new(interval);

        let first = limiter.wait_turn().await;
        let second = limiter.wait_turn().await;
        let third = limiter.wait_turn().await;

        assert!(second - first >= interval);
        assert!(third - second >= interval);
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let interval = Duration::from_millis(80);
        let limiter = Arc::new(RateLimiter::new(interval));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.wait_turn().await })
            })
            .collect();

        let mut dispatched = Vec::new();
        for handle in handles {
            dispatched.push(handle.await.unwrap());
        }
        dispatched.sort();

        for pair in dispatched.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test]
    async fn test_no_wait_after_interval_elapsed() {
        let interval = Duration::from_millis(200);
        let limiter = RateLimiter::new(interval);

        limiter.wait_turn().await;
        sleep(Duration::from_millis(250)).await;

        let before = Instant::now();
        limiter.wait_turn().await;
        assert!(before.elapsed() < Duration::from_millis(100));
    }
}
