//! Resilient HTTP fetcher shared by every source adapter.
//!
//! Wraps the per-domain [`RateLimiter`] around every request, applies the
//! retry policy from [`retry`], and converts every failure into `None` so a
//! single bad page never aborts a multi-page search.

mod challenge;
mod retry;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pricescout_core::{AppConfig, DomainSet, SourcesConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ScraperError;
use crate::origin::{absolutize, host_of};
use crate::rate_limit::RateLimiter;

pub use retry::RetryPolicy;

use challenge::looks_like_bot_challenge;
use retry::retry_with_backoff;

/// Browser user agents rotated in on retries; some storefronts block the
/// first fingerprint they see from an address but not the next.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Default `Retry-After` when a 429 carries none.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub ssl_bypass_domains: DomainSet,
    pub header_overrides: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: BROWSER_USER_AGENTS[0].to_string(),
            retry: RetryPolicy::default(),
            ssl_bypass_domains: DomainSet::default(),
            header_overrides: BTreeMap::new(),
        }
    }
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(app: &AppConfig, sources: &SourcesConfig) -> Self {
        Self {
            timeout: Duration::from_secs(app.request_timeout_secs),
            user_agent: app.user_agent.clone(),
            retry: RetryPolicy {
                max_retries: app.max_retries,
                backoff_step: Duration::from_millis(app.retry_backoff_ms),
                retry_after_cap: Duration::from_secs(app.retry_after_cap_secs),
            },
            ssl_bypass_domains: sources.ssl_bypass_domains.clone(),
            header_overrides: sources.header_overrides.clone(),
        }
    }
}

/// A successfully fetched document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Point-in-time copy of the fetcher's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMetrics {
    pub requests: u64,
    pub successes: u64,
    pub retries: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    successes: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

pub struct Fetcher {
    client: Client,
    insecure_client: Client,
    no_redirect_client: Client,
    insecure_no_redirect_client: Client,
    limiter: Arc<RateLimiter>,
    config: FetcherConfig,
    counters: Counters,
}

impl Fetcher {
    /// Builds the fetcher and its underlying clients.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if a `reqwest::Client` cannot be
    /// constructed (e.g., invalid TLS config).
    pub fn new(config: FetcherConfig, limiter: Arc<RateLimiter>) -> Result<Self, ScraperError> {
        let build = |insecure: bool, follow: bool| -> Result<Client, ScraperError> {
            let mut builder = Client::builder()
                .timeout(config.timeout)
                .connect_timeout(Duration::from_secs(10))
                .user_agent(config.user_agent.as_str())
                .danger_accept_invalid_certs(insecure);
            if !follow {
                builder = builder.redirect(reqwest::redirect::Policy::none());
            }
            Ok(builder.build()?)
        };

        Ok(Self {
            client: build(false, true)?,
            insecure_client: build(true, true)?,
            no_redirect_client: build(false, false)?,
            insecure_no_redirect_client: build(true, false)?,
            limiter,
            config,
            counters: Counters::default(),
        })
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    #[must_use]
    pub fn metrics(&self) -> FetchMetrics {
        FetchMetrics {
            requests: self.counters.requests.load(Ordering::Relaxed),
            successes: self.counters.successes.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn bypasses_ssl(&self, url: &str) -> bool {
        host_of(url).is_some_and(|h| self.config.ssl_bypass_domains.contains_host(&h))
    }

    fn client_for(&self, url: &str, follow_redirects: bool) -> &Client {
        match (self.bypasses_ssl(url), follow_redirects) {
            (false, true) => &self.client,
            (true, true) => &self.insecure_client,
            (false, false) => &self.no_redirect_client,
            (true, false) => &self.insecure_no_redirect_client,
        }
    }

    /// Default browser headers, then per-domain overrides, then `extra`.
    fn headers_for(&self, url: &str, extra: Option<&HeaderMap>, attempt: u32) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("he-IL,he;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(
            reqwest::header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        );
        if attempt > 0 {
            let idx = (rand::random::<u32>() as usize) % BROWSER_USER_AGENTS.len();
            headers.insert(
                reqwest::header::USER_AGENT,
                HeaderValue::from_static(BROWSER_USER_AGENTS[idx]),
            );
        }

        if let Some(host) = host_of(url) {
            for (domain, overrides) in &self.config.header_overrides {
                if host == *domain || host.ends_with(&format!(".{domain}")) {
                    for (name, value) in overrides {
                        match (
                            HeaderName::from_bytes(name.as_bytes()),
                            HeaderValue::from_str(value),
                        ) {
                            (Ok(name), Ok(value)) => {
                                headers.insert(name, value);
                            }
                            _ => tracing::warn!(domain, header = name, "ignoring invalid header override"),
                        }
                    }
                }
            }
        }

        if let Some(extra) = extra {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }
        headers
    }

    /// Fetches `url` with rate limiting, retries and graceful failure.
    ///
    /// Returns `None` on any failure: terminal 4xx, connection/DNS errors,
    /// or transient errors that outlived the retry budget.
    pub async fn get(&self, url: &str, headers: Option<&HeaderMap>) -> Option<FetchedPage> {
        let result = retry_with_backoff(&self.config.retry, |attempt| async move {
            self.send_get(url, headers, attempt).await
        })
        .await;
        self.settle(url, result)
    }

    /// Fetches `url` and deserializes the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Option<T> {
        let page = self.get(url, headers).await?;
        match serde_json::from_str::<T>(&page.body) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = ScraperError::Deserialize {
                    context: format!("JSON body from {url}"),
                    source: e,
                };
                tracing::warn!(url, error = %err, "response body is not the expected JSON");
                None
            }
        }
    }

    /// Issues a HEAD request without following redirects and returns the
    /// absolute `Location` target, if the response is a redirect.
    pub async fn head_location(&self, url: &str) -> Option<String> {
        let result = retry_with_backoff(&self.config.retry, |attempt| async move {
            self.send_head(url, attempt).await
        })
        .await;
        self.settle(url, result).flatten()
    }

    fn settle<T>(&self, url: &str, result: Result<T, ScraperError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.counters.successes.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(err) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(url, error = %err, "fetch failed");
                None
            }
        }
    }

    async fn before_attempt(&self, url: &str, attempt: u32) {
        if attempt > 0 {
            self.counters.retries.fetch_add(1, Ordering::Relaxed);
        }
        self.limiter.acquire(url).await;
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
    }

    async fn send_get(
        &self,
        url: &str,
        extra: Option<&HeaderMap>,
        attempt: u32,
    ) -> Result<FetchedPage, ScraperError> {
        reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        self.before_attempt(url, attempt).await;

        let response = self
            .client_for(url, true)
            .get(url)
            .headers(self.headers_for(url, extra, attempt))
            .send()
            .await?;
        let status = response.status();
        check_status(status, response.headers(), url)?;

        let final_url = response.url().to_string();
        let body = response.text().await?;
        if looks_like_bot_challenge(&body) {
            return Err(ScraperError::Blocked {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }

    async fn send_head(&self, url: &str, attempt: u32) -> Result<Option<String>, ScraperError> {
        reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        self.before_attempt(url, attempt).await;

        let response = self
            .client_for(url, false)
            .head(url)
            .headers(self.headers_for(url, None, attempt))
            .send()
            .await?;
        let status = response.status();
        if status.is_redirection() {
            return Ok(response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|loc| absolutize(url, loc)));
        }
        check_status(status, response.headers(), url)?;
        Ok(None)
    }
}

/// Maps a non-success status to the error class that drives retry policy.
fn check_status(status: StatusCode, headers: &HeaderMap, url: &str) -> Result<(), ScraperError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ScraperError::RateLimited {
            domain: host_of(url).unwrap_or_else(|| url.to_owned()),
            retry_after_secs,
        });
    }
    if status == StatusCode::FORBIDDEN {
        return Err(ScraperError::Blocked {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    if status.is_server_error() {
        return Err(ScraperError::ServerError {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Err(ScraperError::ClientError {
        status: status.as_u16(),
        url: url.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_classifies_responses() {
        let headers = HeaderMap::new();
        let url = "https://shop.example/p";
        assert!(check_status(StatusCode::OK, &headers, url).is_ok());
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, &headers, url),
            Err(ScraperError::Blocked { status: 403, .. })
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, &headers, url),
            Err(ScraperError::ServerError { status: 502, .. })
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, &headers, url),
            Err(ScraperError::ClientError { status: 404, .. })
        ));
    }

    #[test]
    fn check_status_reads_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, HeaderValue::from_static("12"));
        match check_status(StatusCode::TOO_MANY_REQUESTS, &headers, "https://www.zap.co.il/x") {
            Err(ScraperError::RateLimited {
                domain,
                retry_after_secs,
            }) => {
                assert_eq!(domain, "zap.co.il");
                assert_eq!(retry_after_secs, 12);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn headers_apply_domain_overrides_and_extras() {
        let mut overrides = BTreeMap::new();
        let mut zap = BTreeMap::new();
        zap.insert("Referer".to_string(), "https://www.zap.co.il/".to_string());
        overrides.insert("zap.co.il".to_string(), zap);
        let fetcher = Fetcher::new(
            FetcherConfig {
                header_overrides: overrides,
                ..FetcherConfig::default()
            },
            Arc::new(RateLimiter::default()),
        )
        .unwrap();

        let mut extra = HeaderMap::new();
        extra.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        let headers = fetcher.headers_for("https://www.zap.co.il/search", Some(&extra), 0);
        assert_eq!(headers[reqwest::header::REFERER], "https://www.zap.co.il/");
        assert_eq!(headers[reqwest::header::ACCEPT], "application/json");
        assert!(headers.get(reqwest::header::USER_AGENT).is_none());

        let other = fetcher.headers_for("https://ksp.co.il/", None, 0);
        assert!(other.get(reqwest::header::REFERER).is_none());
    }

    #[test]
    fn retries_rotate_user_agent() {
        let fetcher =
            Fetcher::new(FetcherConfig::default(), Arc::new(RateLimiter::default())).unwrap();
        let headers = fetcher.headers_for("https://shop.example/", None, 1);
        let ua = headers[reqwest::header::USER_AGENT].to_str().unwrap();
        assert!(BROWSER_USER_AGENTS.contains(&ua));
    }

    #[test]
    fn ssl_bypass_is_limited_to_listed_domains() {
        let fetcher = Fetcher::new(
            FetcherConfig {
                ssl_bypass_domains: DomainSet::new(["broken.co.il"]),
                ..FetcherConfig::default()
            },
            Arc::new(RateLimiter::default()),
        )
        .unwrap();
        assert!(fetcher.bypasses_ssl("https://www.broken.co.il/item"));
        assert!(!fetcher.bypasses_ssl("https://fine.co.il/item"));
    }
}
