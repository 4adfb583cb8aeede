//! The price-lookup surface with caching and seller-directory writes.
//!
//! This is the single composition point: one fetcher, one rate limiter,
//! one cache and one database pool are built here and shared by every
//! command.

use std::sync::Arc;

use chrono::Utc;
use pricescout_cache::{CachePolicy, CacheType, Cached, SqliteStore, TwoTierCache};
use pricescout_core::{AppConfig, SellerAggregation, SellerInfo, SourcesConfig};
use pricescout_db::NewSeller;
use pricescout_scraper::extract::is_mobile;
use pricescout_scraper::origin::host_of;
use pricescout_scraper::search::AGGREGATE_RESULTS_PER_QUERY;
use pricescout_scraper::version::{contact_version, search_version};
use pricescout_scraper::{
    AdapterContext, AdapterRegistry, PriceSearch, SearchOutcome, SellerNormalizer,
};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

pub(crate) struct PriceService {
    search: PriceSearch,
    cache: Arc<TwoTierCache>,
    policy: CachePolicy,
    pool: SqlitePool,
    cleanup: Option<JoinHandle<()>>,
}

impl PriceService {
    /// Connects the database, applies migrations and wires every component.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or if
    /// an HTTP client cannot be built.
    pub(crate) async fn build(app: &AppConfig, sources: &SourcesConfig) -> anyhow::Result<Self> {
        let pool = pricescout_db::connect_pool(&app.database_url, pricescout_db::PoolConfig::default())
            .await?;
        let applied = pricescout_db::run_migrations(&pool).await?;
        if applied > 0 {
            tracing::info!(applied, "database migrations applied");
        }

        let policy = CachePolicy::from_app_config(app);
        let cache = Arc::new(TwoTierCache::new(
            Arc::new(SqliteStore::new(pool.clone())),
            policy.memory_items,
        ));
        let cleanup = policy
            .enabled
            .then(|| Arc::clone(&cache).spawn_cleanup(policy.cleanup_interval));

        let ctx = AdapterContext::from_config(app, sources)?;
        let registry = Arc::new(AdapterRegistry::with_defaults(&ctx));
        let normalizer = Arc::new(SellerNormalizer::from_sources(sources));
        let search = PriceSearch::new(registry, normalizer, ctx);

        Ok(Self {
            search,
            cache,
            policy,
            pool,
            cleanup,
        })
    }

    pub(crate) fn cache(&self) -> &TwoTierCache {
        &self.cache
    }

    fn cache_handle(&self) -> Option<Arc<TwoTierCache>> {
        Some(Arc::clone(&self.cache))
    }

    /// Cached multi-source search. Outcomes where every source failed are
    /// never cached.
    pub(crate) async fn search(
        &self,
        query: &str,
        country: &str,
        max_results: usize,
        bypass: bool,
    ) -> SearchOutcome {
        let cached = Cached::new(
            self.cache_handle(),
            &self.policy,
            CacheType::Scraper,
            "search",
            search_version(),
            |(query, country, max_results): (String, String, usize)| async move {
                self.search.search(&query, &country, max_results).await
            },
        )
        .with_cacheable(|outcome: &SearchOutcome| !outcome.is_unavailable());

        cached
            .call((query.to_string(), country.to_uppercase(), max_results), bypass)
            .await
    }

    /// Runs the cached search per query, then ranks sellers by how many of
    /// the queries they can fill.
    pub(crate) async fn search_aggregated(
        &self,
        queries: &[String],
        country: &str,
        top_stores: usize,
        bypass: bool,
    ) -> Vec<SellerAggregation> {
        self.search
            .search_aggregated_with(queries, top_stores, |query| async move {
                self.search(&query, country, AGGREGATE_RESULTS_PER_QUERY, bypass)
                    .await
            })
            .await
    }

    /// Seller identity and contact for a seller page. Fresh lookups are
    /// written to the seller directory.
    pub(crate) async fn get_seller_details(
        &self,
        url: &str,
        country: &str,
        bypass: bool,
    ) -> Option<SellerInfo> {
        let cached = Cached::new(
            self.cache_handle(),
            &self.policy,
            CacheType::Contact,
            "seller_details",
            contact_version(),
            |(url, country): (String, String)| async move {
                let details = self.search.get_seller_details(&url, &country).await;
                if let Some(details) = &details {
                    self.record_seller(&url, details).await;
                }
                details
            },
        )
        .with_cacheable(Option::is_some);

        cached
            .call((url.to_string(), country.to_uppercase()), bypass)
            .await
    }

    /// Normalized phone or WhatsApp number for a seller page. Shares the
    /// `seller_details` cache entry, so a contact lookup also updates the
    /// seller directory.
    pub(crate) async fn extract_contact_info(
        &self,
        url: &str,
        country: &str,
        bypass: bool,
    ) -> Option<String> {
        self.get_seller_details(url, country, bypass)
            .await
            .and_then(|details| details.whatsapp_number)
    }

    async fn record_seller(&self, url: &str, details: &SellerInfo) {
        let Some(domain) = host_of(url) else {
            return;
        };
        let contact = details.whatsapp_number.as_deref();
        let (whatsapp_number, phone_number) = match contact {
            Some(number) if is_mobile(number) => (Some(number), None),
            Some(number) => (None, Some(number)),
            None => (None, None),
        };
        let row = NewSeller {
            seller_name: &details.name,
            domain: &domain,
            phone_number,
            whatsapp_number,
            website_url: details.website_url.as_deref(),
            country: &details.country,
            reliability_score: details.reliability_score,
            scraped_at: Utc::now(),
        };
        match pricescout_db::upsert_seller(&self.pool, &row).await {
            Ok(saved) => tracing::debug!(domain = %saved.domain, id = saved.id, "seller directory updated"),
            Err(e) => tracing::warn!(domain, error = %e, "failed to update seller directory"),
        }
    }
}

impl Drop for PriceService {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup.take() {
            handle.abort();
        }
    }
}
