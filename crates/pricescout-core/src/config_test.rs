use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PRICESCOUT_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.database_url, "sqlite://pricescout.db");
    assert_eq!(cfg.request_timeout_secs, 20);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_ms, 1000);
    assert_eq!(cfg.retry_after_cap_secs, 30);
    assert_eq!(cfg.redirect_concurrency, 5);
    assert_eq!(cfg.price_min, 50);
    assert_eq!(cfg.price_max, 500_000);
    assert!(cfg.cache_enabled);
    assert_eq!(cfg.cache_memory_items, 1000);
    assert_eq!(cfg.cache_ttl_scraper_secs, 21_600);
    assert_eq!(cfg.cache_ttl_contact_secs, 604_800);
    assert_eq!(cfg.cache_ttl_agent_secs, 3_600);
    assert_eq!(cfg.cache_cleanup_interval_secs, 3_600);
    assert!(cfg.browserless_url.is_none());
    assert!(cfg.browserless_token.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("PRICESCOUT_ENV", "production");
    map.insert("PRICESCOUT_MAX_RETRIES", "5");
    map.insert("PRICESCOUT_CACHE_ENABLED", "false");
    map.insert("PRICESCOUT_CACHE_TTL_CONTACT_SECS", "60");
    map.insert("BROWSERLESS_URL", "http://browserless:3000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.max_retries, 5);
    assert!(!cfg.cache_enabled);
    assert_eq!(cfg.cache_ttl_contact_secs, 60);
    assert_eq!(
        cfg.browserless_url.as_deref(),
        Some("http://browserless:3000")
    );
}

#[test]
fn build_app_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("PRICESCOUT_REQUEST_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PRICESCOUT_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_inverted_price_bounds() {
    let mut map = HashMap::new();
    map.insert("PRICESCOUT_PRICE_MIN", "1000");
    map.insert("PRICESCOUT_PRICE_MAX", "10");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_PRICE_MIN"),
        "expected InvalidEnvVar(PRICESCOUT_PRICE_MIN), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_redirect_concurrency() {
    let mut map = HashMap::new();
    map.insert("PRICESCOUT_REDIRECT_CONCURRENCY", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_err());
}

#[test]
fn build_app_config_rejects_garbage_boolean() {
    let mut map = HashMap::new();
    map.insert("PRICESCOUT_CACHE_ENABLED", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_CACHE_ENABLED"),
        "expected InvalidEnvVar(PRICESCOUT_CACHE_ENABLED), got: {result:?}"
    );
}

#[test]
fn empty_browserless_url_is_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("BROWSERLESS_URL", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.browserless_url.is_none());
}

#[test]
fn debug_output_redacts_browserless_token() {
    let mut map = HashMap::new();
    map.insert("BROWSERLESS_TOKEN", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn default_matches_empty_environment() {
    let map: HashMap<&str, &str> = HashMap::new();
    let built = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(format!("{built:?}"), format!("{:?}", AppConfig::default()));
}
