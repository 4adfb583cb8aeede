use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; only malformed values fail.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("PRICESCOUT_ENV", "development"))?;
    let log_level = or_default("PRICESCOUT_LOG_LEVEL", "info");
    let database_url = or_default("DATABASE_URL", "sqlite://pricescout.db");
    let sources_path = PathBuf::from(or_default(
        "PRICESCOUT_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let request_timeout_secs: u64 =
        parse_var(&or_default, "PRICESCOUT_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("PRICESCOUT_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries: u32 = parse_var(&or_default, "PRICESCOUT_MAX_RETRIES", "3")?;
    let retry_backoff_ms: u64 = parse_var(&or_default, "PRICESCOUT_RETRY_BACKOFF_MS", "1000")?;
    let retry_after_cap_secs: u64 =
        parse_var(&or_default, "PRICESCOUT_RETRY_AFTER_CAP_SECS", "30")?;
    let redirect_concurrency: usize =
        parse_var(&or_default, "PRICESCOUT_REDIRECT_CONCURRENCY", "5")?;
    let price_min: u64 = parse_var(&or_default, "PRICESCOUT_PRICE_MIN", "50")?;
    let price_max: u64 = parse_var(&or_default, "PRICESCOUT_PRICE_MAX", "500000")?;

    if price_min > price_max {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICESCOUT_PRICE_MIN".to_string(),
            reason: format!("{price_min} exceeds PRICESCOUT_PRICE_MAX ({price_max})"),
        });
    }
    if redirect_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICESCOUT_REDIRECT_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let cache_enabled = parse_bool(
        "PRICESCOUT_CACHE_ENABLED",
        &or_default("PRICESCOUT_CACHE_ENABLED", "true"),
    )?;
    let cache_memory_items: usize =
        parse_var(&or_default, "PRICESCOUT_CACHE_MEMORY_ITEMS", "1000")?;
    let cache_ttl_scraper_secs: i64 =
        parse_var(&or_default, "PRICESCOUT_CACHE_TTL_SCRAPER_SECS", "21600")?;
    let cache_ttl_contact_secs: i64 =
        parse_var(&or_default, "PRICESCOUT_CACHE_TTL_CONTACT_SECS", "604800")?;
    let cache_ttl_agent_secs: i64 =
        parse_var(&or_default, "PRICESCOUT_CACHE_TTL_AGENT_SECS", "3600")?;
    let cache_cleanup_interval_secs: u64 =
        parse_var(&or_default, "PRICESCOUT_CACHE_CLEANUP_INTERVAL_SECS", "3600")?;

    let browserless_url = lookup("BROWSERLESS_URL").ok().filter(|s| !s.is_empty());
    let browserless_token = lookup("BROWSERLESS_TOKEN").ok().filter(|s| !s.is_empty());

    Ok(AppConfig {
        env,
        log_level,
        database_url,
        sources_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_ms,
        retry_after_cap_secs,
        redirect_concurrency,
        price_min,
        price_max,
        cache_enabled,
        cache_memory_items,
        cache_ttl_scraper_secs,
        cache_ttl_contact_secs,
        cache_ttl_agent_secs,
        cache_cleanup_interval_secs,
        browserless_url,
        browserless_token,
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICESCOUT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
