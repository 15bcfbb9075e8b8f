use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded exponential backoff applied only to transient API failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (0-based), doubled each time and capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    pub async fn execute<F, Fut, T>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    retry += 1;
                    tracing::warn!(
                        "🔄 {} failed with a transient error (retry {}/{} in {:?}): {}",
                        operation,
                        retry,
                        self.max_retries,
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if retry > 0 {
                        tracing::debug!("{} gave up after {} retries", operation, retry);
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
