//! Search orchestration across the registered sources of one country.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use pricescout_core::{PriceOption, SellerAggregation, SellerInfo};
use serde::{Deserialize, Serialize};

use crate::adapters::common::{fetch_contact, fetch_seller_details};
use crate::adapters::{AdapterContext, AdapterRegistry};
use crate::aggregate::aggregate;
use crate::seller::SellerNormalizer;

/// Listings requested per query when building seller aggregations.
pub const AGGREGATE_RESULTS_PER_QUERY: usize = 20;

/// Result of a multi-source search.
///
/// `NoResults` means the sources answered and nothing is for sale;
/// `Unavailable` means no source could be queried at all and the caller
/// should try again later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(Vec<PriceOption>),
    NoResults,
    Unavailable { failed_sources: Vec<String> },
}

impl SearchOutcome {
    #[must_use]
    pub fn options(&self) -> &[PriceOption] {
        match self {
            Self::Found(options) => options,
            Self::NoResults | Self::Unavailable { .. } => &[],
        }
    }

    #[must_use]
    pub fn into_options(self) -> Vec<PriceOption> {
        match self {
            Self::Found(options) => options,
            Self::NoResults | Self::Unavailable { .. } => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

pub struct PriceSearch {
    registry: Arc<AdapterRegistry>,
    normalizer: Arc<SellerNormalizer>,
    ctx: AdapterContext,
}

impl PriceSearch {
    #[must_use]
    pub fn new(
        registry: Arc<AdapterRegistry>,
        normalizer: Arc<SellerNormalizer>,
        ctx: AdapterContext,
    ) -> Self {
        Self {
            registry,
            normalizer,
            ctx,
        }
    }

    #[must_use]
    pub fn normalizer(&self) -> &SellerNormalizer {
        &self.normalizer
    }

    /// Queries every source for `country` one after another, in priority
    /// order. Sources are never queried in parallel.
    ///
    /// Listings from the same canonical seller at the same price are
    /// collapsed, keeping the higher-priority source. The result is sorted by
    /// ascending price and truncated to `max_results`.
    pub async fn search(&self, query: &str, country: &str, max_results: usize) -> SearchOutcome {
        let adapters = self.registry.adapters_for(country);
        if adapters.is_empty() {
            tracing::info!(query, country, "no sources registered for country");
            return SearchOutcome::NoResults;
        }

        let mut answered = 0usize;
        let mut failed_sources = Vec::new();
        let mut collected: Vec<PriceOption> = Vec::new();
        for adapter in &adapters {
            match adapter.search(query, max_results).await {
                Ok(options) => {
                    answered += 1;
                    tracing::debug!(source = adapter.name(), query, results = options.len(), "source answered");
                    collected.extend(options);
                }
                Err(e) => {
                    tracing::warn!(source = adapter.name(), query, error = %e, "source failed");
                    failed_sources.push(e.source_name().to_string());
                }
            }
        }

        if collected.is_empty() {
            if answered == 0 {
                tracing::warn!(query, country, ?failed_sources, "all sources unavailable");
                return SearchOutcome::Unavailable { failed_sources };
            }
            tracing::info!(query, country, "no listings found");
            return SearchOutcome::NoResults;
        }

        let mut seen = HashSet::new();
        let mut options: Vec<PriceOption> = collected
            .into_iter()
            .filter(|o| {
                let key = self
                    .normalizer
                    .normalize(&o.seller.name, o.seller.website_url.as_deref().or(Some(o.url.as_str())));
                seen.insert((key, o.price))
            })
            .collect();
        options.sort_by(|a, b| a.price.cmp(&b.price));
        options.truncate(max_results);

        tracing::info!(
            query,
            country,
            results = options.len(),
            failed = failed_sources.len(),
            "search complete"
        );
        SearchOutcome::Found(options)
    }

    /// Runs [`Self::search`] for each query and ranks sellers by how many of
    /// the queries they can fill.
    pub async fn search_aggregated(
        &self,
        queries: &[String],
        country: &str,
        top_stores: usize,
    ) -> Vec<SellerAggregation> {
        self.search_aggregated_with(queries, top_stores, |query| async move {
            self.search(&query, country, AGGREGATE_RESULTS_PER_QUERY).await
        })
        .await
    }

    /// Aggregation over a caller-supplied per-query search, so a caching
    /// layer can answer each query from its own entries. Queries run one
    /// after another.
    pub async fn search_aggregated_with<F, Fut>(
        &self,
        queries: &[String],
        top_stores: usize,
        mut search: F,
    ) -> Vec<SellerAggregation>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = SearchOutcome>,
    {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let outcome = search(query.clone()).await;
            results.push((query.clone(), outcome.into_options()));
        }
        tracing::debug!(queries = queries.len(), top_stores, "aggregating sellers");
        aggregate(&self.normalizer, &results, top_stores)
    }

    pub async fn extract_contact_info(&self, url: &str) -> Option<String> {
        fetch_contact(&self.ctx, url).await
    }

    pub async fn get_seller_details(&self, url: &str, country: &str) -> Option<SellerInfo> {
        fetch_seller_details(&self.ctx, "direct", country, url).await
    }
}
