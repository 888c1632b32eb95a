//! Failure-counting circuit breaker.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    open_until: Option<Instant>,
}

/// Opens after `threshold` counted failures and rejects calls for `cooldown`.
///
/// Once the cooldown has passed, calls are let through again. The first
/// success closes the circuit and zeroes the counter; another failure while
/// the counter is still at or above the threshold re-opens it immediately.
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Time left before calls are allowed again, or `None` if closed.
    pub async fn remaining_open(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        state
            .open_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Record a successful call.
    pub async fn record_success(&self) {
        let mut state = self.state.lock().await;
        if state.open_until.is_some() {
            info!("Circuit breaker closed after successful call");
        }
        state.failures = 0;
        state.open_until = None;
    }

    /// Record a counted failure. Returns `true` if this failure opened the
    /// circuit.
    pub async fn record_failure(&self) -> bool {
        let mut state = self.state.lock().await;
        state.failures = state.failures.saturating_add(1);

        if state.failures >= self.threshold {
            state.open_until = Some(Instant::now() + self.cooldown);
            error!(
                "Circuit breaker opened after {} failures, cooling down for {}s",
                state.failures,
                self.cooldown.as_secs()
            );
            return true;
        }

        false
    }

    pub async fn failure_count(&self) -> u32 {
        self.state.lock().await.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_opens_at_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));

        assert!(!breaker.record_failure().await);
        assert!(!breaker.record_failure().await);
        assert!(breaker.remaining_open().await.is_none());

        assert!(breaker.record_failure().await);
        let remaining = breaker.remaining_open().await.unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.failure_count().await, 2);

        breaker.record_success().await;
        assert_eq!(breaker.failure_count().await, 0);
    }

    #[tokio::test]
    async fn test_cooldown_expiry_allows_calls_and_success_closes() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
        assert!(breaker.record_failure().await);
        assert!(breaker.remaining_open().await.is_some());

        sleep(Duration::from_millis(80)).await;
        assert!(breaker.remaining_open().await.is_none());

        breaker.record_success().await;
        assert_eq!(breaker.failure_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_after_cooldown_reopens() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(50));
        breaker.record_failure().await;
        breaker.record_failure().await;

        sleep(Duration::from_millis(80)).await;
        assert!(breaker.remaining_open().await.is_none());

        assert!(breaker.record_failure().await);
        assert!(breaker.remaining_open().await.is_some());
    }

    #[tokio::test]
    async fn test_zero_threshold_treated_as_one() {
        let breaker = CircuitBreaker::new(0, Duration::from_secs(1));
        assert!(breaker.record_failure().await);
    }
}
