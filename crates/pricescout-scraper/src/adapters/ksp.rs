//! ksp.co.il: retailer with a JSON search API.

use async_trait::async_trait;
use pricescout_core::{PriceOption, SellerInfo};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

use super::common::{price_option, search_url};
use super::relevance::is_relevant;
use super::{AdapterContext, SourceAdapter};
use crate::error::AdapterError;
use crate::extract::json_amount;
use crate::origin::origin_of;

pub const KSP_BASE_URL: &str = "https://ksp.co.il";
const NAME: &str = "ksp";
const SELLER_NAME: &str = "KSP";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    uin: serde_json::Value,
    name: String,
    price: serde_json::Value,
}

pub struct KspAdapter {
    ctx: AdapterContext,
    base_url: String,
}

impl KspAdapter {
    #[must_use]
    pub fn new(ctx: AdapterContext) -> Self {
        Self::with_base_url(ctx, KSP_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(ctx: AdapterContext, base_url: &str) -> Self {
        Self {
            ctx,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn item_url(&self, uin: &serde_json::Value) -> Option<String> {
        let id = match uin {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };
        Some(format!("{}/web/item/{id}", self.base_url))
    }
}

#[async_trait]
impl SourceAdapter for KspAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn country(&self) -> &'static str {
        "IL"
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<PriceOption>, AdapterError> {
        let url = search_url(&self.base_url, "/m_action/api/category/?search=", query);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let page = self
            .ctx
            .fetcher
            .get(&url, Some(&headers))
            .await
            .ok_or(AdapterError::Unavailable {
                source_name: NAME,
                url: url.clone(),
            })?;
        let response: SearchResponse =
            serde_json::from_str(&page.body).map_err(|e| AdapterError::UnexpectedResponse {
                source_name: NAME,
                reason: format!("search JSON: {e}"),
            })?;

        let website = origin_of(&self.base_url);
        let mut options: Vec<PriceOption> = response
            .result
            .items
            .into_iter()
            .filter(|item| is_relevant(query, &item.name))
            .filter_map(|item| {
                let price = json_amount(&item.price)?;
                if !self.ctx.prices.in_bounds(price) {
                    return None;
                }
                let url = self.item_url(&item.uin)?;
                let seller = SellerInfo {
                    name: SELLER_NAME.to_string(),
                    website_url: website.clone(),
                    whatsapp_number: None,
                    country: self.country().to_string(),
                    source_adapter: NAME.to_string(),
                    reliability_score: None,
                };
                Some(price_option(query, item.name, seller, price, url))
            })
            .collect();
        options.sort_by(|a, b| a.price.cmp(&b.price));
        options.truncate(max_results);

        tracing::info!(source = NAME, query, results = options.len(), "search complete");
        Ok(options)
    }
}
