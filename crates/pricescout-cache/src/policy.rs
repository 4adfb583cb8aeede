use std::time::Duration;

use pricescout_core::AppConfig;

use crate::key::CacheType;

/// Cache switches and per-type TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub enabled: bool,
    pub memory_items: usize,
    pub ttl_scraper_secs: i64,
    pub ttl_contact_secs: i64,
    pub ttl_agent_secs: i64,
    pub cleanup_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            memory_items: 1000,
            ttl_scraper_secs: 6 * 60 * 60,
            ttl_contact_secs: 7 * 24 * 60 * 60,
            ttl_agent_secs: 60 * 60,
            cleanup_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl CachePolicy {
    #[must_use]
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            enabled: app.cache_enabled,
            memory_items: app.cache_memory_items,
            ttl_scraper_secs: app.cache_ttl_scraper_secs,
            ttl_contact_secs: app.cache_ttl_contact_secs,
            ttl_agent_secs: app.cache_ttl_agent_secs,
            cleanup_interval: Duration::from_secs(app.cache_cleanup_interval_secs),
        }
    }

    #[must_use]
    pub fn ttl_secs(&self, cache_type: CacheType) -> i64 {
        match cache_type {
            CacheType::Scraper => self.ttl_scraper_secs,
            CacheType::Contact => self.ttl_contact_secs,
            CacheType::Agent => self.ttl_agent_secs,
        }
    }
}
