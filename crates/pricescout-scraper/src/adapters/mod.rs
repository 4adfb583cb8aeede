//! Per-site source adapters and the registry that orders them.
//!
//! Adapters own their page-parsing quirks only. Fetching, price and contact
//! extraction, and redirect resolution all go through the shared
//! [`AdapterContext`].

mod bug;
pub(crate) mod common;
mod ksp;
mod registry;
pub mod relevance;
mod wisebuy;
mod zap;

use std::sync::Arc;

use async_trait::async_trait;
use pricescout_core::{AppConfig, PriceOption, SellerInfo, SourcesConfig};

use crate::client::{Fetcher, FetcherConfig};
use crate::error::{AdapterError, ScraperError};
use crate::extract::{BrowserlessProbe, ContactExtractor, PriceExtractor};
use crate::rate_limit::RateLimiter;
use crate::redirect::RedirectResolver;

pub use bug::BugAdapter;
pub use ksp::KspAdapter;
pub use registry::AdapterRegistry;
pub use wisebuy::WisebuyAdapter;
pub use zap::ZapAdapter;

/// Shared services every adapter delegates to.
#[derive(Clone)]
pub struct AdapterContext {
    pub fetcher: Arc<Fetcher>,
    pub prices: Arc<PriceExtractor>,
    pub contacts: Arc<ContactExtractor>,
    pub resolver: Arc<RedirectResolver>,
}

impl AdapterContext {
    /// Builds every shared service from configuration. The button probe is
    /// enabled only when a Browserless URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn from_config(app: &AppConfig, sources: &SourcesConfig) -> Result<Self, ScraperError> {
        let limiter = Arc::new(RateLimiter::from_sources(sources));
        let fetcher = Arc::new(Fetcher::new(
            FetcherConfig::from_app_config(app, sources),
            Arc::clone(&limiter),
        )?);

        let contacts = match app.browserless_url.as_deref() {
            Some(url) => {
                let probe = BrowserlessProbe::new(url, app.browserless_token.as_deref(), limiter)?;
                ContactExtractor::with_probe(Arc::new(probe))
            }
            None => ContactExtractor::new(),
        };

        let resolver = RedirectResolver::from_sources(Arc::clone(&fetcher), sources)
            .with_concurrency(app.redirect_concurrency);

        Ok(Self {
            fetcher,
            prices: Arc::new(PriceExtractor::from_app_config(app)),
            contacts: Arc::new(contacts),
            resolver: Arc::new(resolver),
        })
    }
}

/// Contract every source implements.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable identifier, also recorded as `SellerInfo::source_adapter`.
    fn name(&self) -> &'static str;

    /// ISO 3166-1 alpha-2 country the source serves.
    fn country(&self) -> &'static str;

    fn context(&self) -> &AdapterContext;

    /// Listings for `query`, at most `max_results`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the source itself could not be queried.
    /// A source that answered with no listings returns `Ok(vec![])`.
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<PriceOption>, AdapterError>;

    /// Seller phone/WhatsApp number from a seller page.
    async fn extract_contact_info(&self, url: &str) -> Option<String> {
        common::fetch_contact(self.context(), url).await
    }

    /// Seller identity from a seller page.
    async fn get_seller_details(&self, url: &str) -> Option<SellerInfo> {
        common::fetch_seller_details(self.context(), self.name(), self.country(), url).await
    }
}
