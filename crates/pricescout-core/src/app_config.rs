use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub database_url: String,
    pub sources_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub retry_after_cap_secs: u64,
    pub redirect_concurrency: usize,
    pub price_min: u64,
    pub price_max: u64,
    pub cache_enabled: bool,
    pub cache_memory_items: usize,
    pub cache_ttl_scraper_secs: i64,
    pub cache_ttl_contact_secs: i64,
    pub cache_ttl_agent_secs: i64,
    pub cache_cleanup_interval_secs: u64,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &self.database_url)
            .field("sources_path", &self.sources_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("retry_after_cap_secs", &self.retry_after_cap_secs)
            .field("redirect_concurrency", &self.redirect_concurrency)
            .field("price_min", &self.price_min)
            .field("price_max", &self.price_max)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_memory_items", &self.cache_memory_items)
            .field("cache_ttl_scraper_secs", &self.cache_ttl_scraper_secs)
            .field("cache_ttl_contact_secs", &self.cache_ttl_contact_secs)
            .field("cache_ttl_agent_secs", &self.cache_ttl_agent_secs)
            .field(
                "cache_cleanup_interval_secs",
                &self.cache_cleanup_interval_secs,
            )
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &self.browserless_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// The documented defaults, identical to an empty environment.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Environment::Development,
            log_level: "info".to_string(),
            database_url: "sqlite://pricescout.db".to_string(),
            sources_path: PathBuf::from("./config/sources.yaml"),
            request_timeout_secs: 20,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            retry_backoff_ms: 1000,
            retry_after_cap_secs: 30,
            redirect_concurrency: 5,
            price_min: 50,
            price_max: 500_000,
            cache_enabled: true,
            cache_memory_items: 1000,
            cache_ttl_scraper_secs: 21_600,
            cache_ttl_contact_secs: 604_800,
            cache_ttl_agent_secs: 3600,
            cache_cleanup_interval_secs: 3600,
            browserless_url: None,
            browserless_token: None,
        }
    }
}
