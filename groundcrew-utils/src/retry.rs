//! ABOUTME: Exponential backoff with jitter for retrying classified-retryable upstream calls

use groundcrew_core::ErrorKind;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt` (1-indexed), exponential in the
    /// attempt number with full jitter (`rand::thread_rng` in `0..=delay`),
    /// capped at `max_delay`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX));
        #[allow(clippy::cast_precision_loss)]
        let base_ms = self.base_delay.as_millis() as f64 * exp;
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        let jittered_ms = rand::thread_rng().gen_range(0.0..=capped_ms.max(1.0));
        Duration::from_millis(jittered_ms as u64)
    }
}

/// Retries `operation` up to `config.max_attempts` times, only for error
/// kinds the shared taxonomy marks retryable (`ErrorKind::retryable`).
/// `retry_after` lets a caller honor an upstream `Retry-After` header on
/// rate-limited responses in place of the computed backoff delay.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    classify: impl Fn(&E) -> ErrorKind,
    retry_after: impl Fn(&E) -> Option<Duration>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let kind = classify(&err);
                if attempt >= config.max_attempts || !kind.retryable() {
                    warn!(attempt, ?kind, "giving up after non-retryable error or attempt cap");
                    return Err(err);
                }
                let delay = retry_after(&err).unwrap_or_else(|| config.delay_for(attempt));
                debug!(attempt, ?kind, delay_ms = delay.as_millis() as u64, "retrying after delay");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum FakeError {
        Transient,
        Fatal,
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            ..RetryConfig::default()
        };
        let result = retry_with_backoff(
            &config,
            |_: &FakeError| ErrorKind::UpstreamTransient,
            |_| None,
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(FakeError::Transient)
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_immediately_on_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default();
        let result: Result<(), FakeError> = retry_with_backoff(
            &config,
            |_: &FakeError| ErrorKind::Schema,
            |_| None,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Fatal) }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn honors_retry_after_override() {
        let config = RetryConfig {
            max_attempts: 2,
            base_delay: Duration::from_secs(30),
            ..RetryConfig::default()
        };
        let calls = AtomicU32::new(0);
        let started = std::time::Instant::now();
        let _: Result<(), FakeError> = retry_with_backoff(
            &config,
            |_: &FakeError| ErrorKind::UpstreamRateLimited,
            |_| Some(Duration::from_millis(5)),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Transient) }
            },
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
