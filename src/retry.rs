use log::{error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::transport::TransportError;

/// Bounded retry with exponential backoff and a deadline per attempt.
///
/// There is no jitter and no circuit breaking: a submission is a one-shot,
/// best-effort call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first retry; doubled after every failed retry.
    pub initial_delay: Duration,
    /// Deadline for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            timeout: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `operation` until it succeeds or `max_retries + 1` attempts have
    /// failed, returning the last failure. The closure receives the 1-based
    /// attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = match timeout(self.timeout, operation(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        info!("✅ {} succeeded on attempt {}/{}", label, attempt, self.max_attempts());
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= self.max_attempts() => {
                    error!("❌ {} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "⚠️ {} attempt {}/{} failed: {} (retrying in {:?})",
                        label,
                        attempt,
                        self.max_attempts(),
                        e,
                        delay
                    );
                    sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
}
