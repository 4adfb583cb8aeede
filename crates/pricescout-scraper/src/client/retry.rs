//! Retry policy for the resilient fetcher.
//!
//! Transient failures (timeouts, 5xx, 429, 403 blocks) are retried with a
//! linearly increasing delay. Terminal failures (DNS/connection errors and
//! any other 4xx) are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff_step * n`.
    pub backoff_step: Duration,
    /// Upper bound applied to a server-provided `Retry-After`.
    pub retry_after_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_secs(1),
            retry_after_cap: Duration::from_secs(30),
        }
    }
}

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Connection-level failures (DNS resolution, refused connections) are not
/// transient for our purposes: the host is gone or wrong, and retrying only
/// burns the per-domain budget.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(e) => {
            if e.is_connect() {
                false
            } else {
                e.is_timeout() || e.is_request() || e.is_body() || e.is_decode()
            }
        }
        ScraperError::RateLimited { .. }
        | ScraperError::Blocked { .. }
        | ScraperError::ServerError { .. } => true,
        ScraperError::ClientError { .. }
        | ScraperError::Deserialize { .. }
        | ScraperError::InvalidUrl { .. } => false,
    }
}

fn delay_for(policy: &RetryPolicy, err: &ScraperError, attempt: u32) -> Duration {
    let linear = policy.backoff_step.saturating_mul(attempt);
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => Duration::from_secs(*retry_after_secs)
            .min(policy.retry_after_cap)
            .max(linear.min(policy.retry_after_cap)),
        _ => linear,
    }
}

/// Executes `operation` with linear-backoff retries on transient errors.
///
/// With `max_retries = 3` and a 1 s step the operation is attempted at most
/// four times, sleeping 1 s, 2 s and 3 s between attempts. A 429 sleeps for
/// its `Retry-After` instead (capped at `retry_after_cap`).
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = delay_for(policy, &err, attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "transient fetch error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
