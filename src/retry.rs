//! Bounded retry with backoff around connection establishment.
//!
//! A [`RetryPolicy`] decides whether a failed attempt is retried and how long
//! to wait first; [`retry`] drives a fallible async operation under a policy.
//! Retrying only ever happens before the first byte of the response body is
//! handed to the caller.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::logging::LogContext;
use crate::observability::{CONNECTION_RETRIES, CONNECTION_RETRY_BACKOFF};

/// Default maximum retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 8_000;

/// Decides whether and when a failed attempt is retried.
pub trait RetryPolicy: Send + Sync {
    /// Returns the delay to wait before retry number `attempt` (1-based) after
    /// `error`, or `None` to give up and surface the error.
    fn backoff(&self, attempt: u32, error: &Error) -> Option<Duration>;
}

/// Never retries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn backoff(&self, _: u32, _: &Error) -> Option<Duration> {
        None
    }
}

/// Exponential backoff over retryable errors.
///
/// The delay before retry `n` is `base_delay * 2^(n-1)`, capped at
/// `max_delay`.  Errors for which [`Error::is_retryable`] is false are
/// surfaced immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialBackoff {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl ExponentialBackoff {
    /// Creates a policy with the given bounds.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
        }
    }

    /// Sets the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The delay before retry `attempt`, ignoring the error kind.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn backoff(&self, attempt: u32, error: &Error) -> Option<Duration> {
        if attempt > self.max_retries || !error.is_retryable() {
            return None;
        }
        Some(self.delay_for(attempt))
    }
}

/// Runs `op` until it succeeds or `policy` gives up.
///
/// Drop the returned future to abandon the operation; this also interrupts a
/// pending backoff sleep.
pub async fn retry<T, F, Fut>(policy: &dyn RetryPolicy, log: &LogContext, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                let Some(delay) = policy.backoff(attempt, &err) else {
                    return Err(err);
                };
                CONNECTION_RETRIES.click();
                CONNECTION_RETRY_BACKOFF.add(delay.as_secs_f64());
                log.warn(
                    "RETRY",
                    &format!("attempt failed, retrying: {err}"),
                    Some(&json!({"attempt": attempt, "delayMs": delay.as_millis() as u64})),
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_double_and_cap() {
        let policy = ExponentialBackoff::new(
            10,
            Duration::from_millis(100),
            Duration::from_millis(1_000),
        );
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(64), Duration::from_millis(1_000));
    }

    #[test]
    fn gives_up_after_max_retries() {
        let policy = ExponentialBackoff::default().with_max_retries(2);
        let err = Error::connection("unavailable", Some(503), None);
        assert!(policy.backoff(1, &err).is_some());
        assert!(policy.backoff(2, &err).is_some());
        assert!(policy.backoff(3, &err).is_none());
    }

    #[test]
    fn non_retryable_errors_are_not_retried() {
        let policy = ExponentialBackoff::default();
        let err = Error::connection("forbidden", Some(403), None);
        assert!(policy.backoff(1, &err).is_none());
        assert!(NoRetry.backoff(1, &Error::timeout("slow", None)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = ExponentialBackoff::default();
        let result = retry(&policy, &LogContext::disabled(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::connection("unavailable", Some(503), None))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = ExponentialBackoff::default().with_max_retries(1);
        let result: Result<()> = retry(&policy, &LogContext::disabled(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::connection("bad gateway", Some(502), None)) }
        })
        .await;
        assert_eq!(result.unwrap_err().status_code(), Some(502));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&ExponentialBackoff::default(), &LogContext::disabled(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::connection("not found", Some(404), None)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
