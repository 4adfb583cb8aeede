//! Integration tests for the resilient `Fetcher`.
//!
//! Every test stands up a local `wiremock` server; no real network traffic
//! is made. Retry delays are shrunk to milliseconds and the rate limiter is
//! effectively unlimited so the retry policy is what gets exercised.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pricescout_core::RateLimitSpec;
use pricescout_scraper::{FetchMetrics, Fetcher, FetcherConfig, RateLimiter, RetryPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_fetcher(max_retries: u32) -> Fetcher {
    fetcher_with(FetcherConfig {
        timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_retries,
            backoff_step: Duration::from_millis(5),
            retry_after_cap: Duration::from_millis(50),
        },
        ..FetcherConfig::default()
    })
}

fn fetcher_with(config: FetcherConfig) -> Fetcher {
    let limiter = RateLimiter::new(RateLimitSpec {
        rate: 1000.0,
        capacity: 1000.0,
    });
    Fetcher::new(config, Arc::new(limiter)).expect("failed to build test Fetcher")
}

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_returns_body_and_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>₪1,299</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(2);
    let page = fetcher
        .get(&format!("{}/item", server.uri()), None)
        .await
        .expect("expected a page");

    assert_eq!(page.status, 200);
    assert_eq!(page.body, "<p>₪1,299</p>");
    assert_eq!(page.url, format!("{}/item", server.uri()));
    assert_eq!(
        fetcher.metrics(),
        FetchMetrics {
            requests: 1,
            successes: 1,
            retries: 0,
            failures: 0,
        }
    );
}

#[tokio::test]
async fn get_json_deserializes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"total": 7}"#))
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(0);
    let payload: serde_json::Value = fetcher
        .get_json(&format!("{}/api", server.uri()), None)
        .await
        .expect("expected JSON");
    assert_eq!(payload["total"], 7);

    let bad: Option<serde_json::Value> = fetcher.get_json(&format!("{}/missing", server.uri()), None).await;
    assert!(bad.is_none());
}

#[tokio::test]
async fn head_location_reads_redirect_without_following() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/redir/1"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/landing"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(0);
    let location = fetcher
        .head_location(&format!("{}/redir/1", server.uri()))
        .await;
    assert_eq!(location, Some(format!("{}/landing", server.uri())));
}

#[tokio::test]
async fn domain_header_overrides_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("referer", "https://portal.example/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut overrides = BTreeMap::new();
    overrides.insert(
        "127.0.0.1".to_string(),
        BTreeMap::from([("Referer".to_string(), "https://portal.example/".to_string())]),
    );
    let fetcher = fetcher_with(FetcherConfig {
        header_overrides: overrides,
        retry: RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        },
        ..FetcherConfig::default()
    });

    assert!(fetcher.get(&format!("{}/", server.uri()), None).await.is_some());
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(3);
    let page = fetcher.get(&format!("{}/flaky", server.uri()), None).await;
    assert_eq!(page.map(|p| p.body).as_deref(), Some("recovered"));

    let metrics = fetcher.metrics();
    assert_eq!(metrics.requests, 3);
    assert_eq!(metrics.retries, 2);
    assert_eq!(metrics.successes, 1);
}

#[tokio::test]
async fn exhausted_server_errors_return_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(2);
    assert!(fetcher.get(&format!("{}/down", server.uri()), None).await.is_none());
    assert_eq!(fetcher.metrics().failures, 1);
}

#[tokio::test]
async fn not_found_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(3);
    assert!(fetcher.get(&format!("{}/gone", server.uri()), None).await.is_none());
}

#[tokio::test]
async fn forbidden_is_retried_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(2);
    assert!(fetcher.get(&format!("{}/p", server.uri()), None).await.is_none());
}

#[tokio::test]
async fn rate_limited_response_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(1);
    let started = std::time::Instant::now();
    let page = fetcher.get(&format!("{}/p", server.uri()), None).await;
    assert!(page.is_some());
    // Retry-After of 1 s is capped at 50 ms by the policy.
    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn challenge_page_is_treated_as_block() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<title>Just a moment...</title><p>Please enable cookies.</p>",
        ))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(1);
    assert!(fetcher.get(&format!("{}/p", server.uri()), None).await.is_none());
}

#[tokio::test]
async fn connection_refused_is_terminal() {
    let fetcher = fast_fetcher(3);
    assert!(fetcher.get("http://127.0.0.1:1/unreachable", None).await.is_none());
    let metrics = fetcher.metrics();
    assert_eq!(metrics.requests, 1);
    assert_eq!(metrics.retries, 0);
    assert_eq!(metrics.failures, 1);
}

#[tokio::test]
async fn invalid_url_returns_none_without_request() {
    let fetcher = fast_fetcher(3);
    assert!(fetcher.get("not a url", None).await.is_none());
    assert_eq!(fetcher.metrics().requests, 0);
}
