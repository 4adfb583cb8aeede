//! Per-domain token-bucket rate limiting for outbound requests.
//!
//! Every request made through [`crate::Fetcher`] first calls
//! [`RateLimiter::acquire`]. Buckets are created lazily per host, each with
//! its own mutex, so callers hitting different domains never contend and
//! callers hitting the same domain are serialized on that bucket only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricescout_core::{RateLimitSpec, SourcesConfig};
use tokio::time::Instant;

use crate::origin::host_of;

/// Token state for a single domain. Invariant: `0 <= tokens <= capacity`.
#[derive(Debug)]
pub struct RateBucket {
    tokens: f64,
    capacity: f64,
    refill_rate_per_sec: f64,
    last_refill: Instant,
}

impl RateBucket {
    /// Creates a full bucket.
    #[must_use]
    pub fn new(spec: RateLimitSpec) -> Self {
        Self {
            tokens: spec.capacity,
            capacity: spec.capacity,
            refill_rate_per_sec: spec.rate,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Time until one whole token is available, zero if one already is.
    fn wait_for_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate_per_sec)
        }
    }

    fn debit(&mut self) {
        self.tokens = (self.tokens - 1.0).max(0.0);
    }

    #[must_use]
    pub fn tokens(&self) -> f64 {
        self.tokens
    }
}

/// Lazily-populated map of per-domain token buckets.
pub struct RateLimiter {
    default_spec: RateLimitSpec,
    overrides: Vec<(String, RateLimitSpec)>,
    buckets: Mutex<HashMap<String, Arc<tokio::sync::Mutex<RateBucket>>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(default_spec: RateLimitSpec) -> Self {
        Self {
            default_spec,
            overrides: Vec::new(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a limiter from the default and per-domain specs in `sources`.
    #[must_use]
    pub fn from_sources(sources: &SourcesConfig) -> Self {
        let mut limiter = Self::new(sources.default_rate_limit);
        for (domain, spec) in &sources.rate_limits {
            limiter = limiter.with_override(domain, *spec);
        }
        limiter
    }

    /// Registers a domain-specific `(rate, capacity)` pair. Matches the
    /// domain itself and any subdomain of it.
    #[must_use]
    pub fn with_override(mut self, domain: &str, spec: RateLimitSpec) -> Self {
        self.overrides.push((domain.to_ascii_lowercase(), spec));
        self
    }

    fn spec_for(&self, domain: &str) -> RateLimitSpec {
        self.overrides
            .iter()
            .find(|(d, _)| domain == d || domain.ends_with(&format!(".{d}")))
            .map_or(self.default_spec, |(_, spec)| *spec)
    }

    fn bucket_for(&self, domain: &str) -> Arc<tokio::sync::Mutex<RateBucket>> {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(
            buckets
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(RateBucket::new(self.spec_for(domain))))),
        )
    }

    /// Waits until a token for `url`'s domain is available, then consumes it.
    ///
    /// Returns how long the caller was made to wait (zero when a token was
    /// immediately available). The value is informational only.
    pub async fn acquire(&self, url: &str) -> Duration {
        let domain = host_of(url).unwrap_or_default();
        let bucket = self.bucket_for(&domain);
        let mut bucket = bucket.lock().await;

        bucket.refill(Instant::now());
        let wait = bucket.wait_for_token();
        if !wait.is_zero() {
            tracing::debug!(
                domain,
                wait_ms = wait.as_millis(),
                "rate limiter delaying request"
            );
            tokio::time::sleep(wait).await;
            bucket.refill(Instant::now());
        }
        bucket.debit();
        wait
    }

    /// Current token count for `domain`, if a bucket exists for it.
    pub async fn available_tokens(&self, domain: &str) -> Option<f64> {
        let bucket = {
            let buckets = self
                .buckets
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            buckets.get(domain).cloned()
        }?;
        let mut bucket = bucket.lock().await;
        bucket.refill(Instant::now());
        Some(bucket.tokens())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitSpec::default())
    }
}
