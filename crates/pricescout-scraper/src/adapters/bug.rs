//! bug.co.il: retailer whose search page links to product pages; prices
//! come from the product pages through the full price engine.

use async_trait::async_trait;
use pricescout_core::{PriceOption, SellerInfo};
use scraper::Html;

use super::common::{price_option, search_url, selector, text_of};
use super::relevance::is_relevant;
use super::{AdapterContext, SourceAdapter};
use crate::error::AdapterError;
use crate::origin::{absolutize, origin_of};

pub const BUG_BASE_URL: &str = "https://www.bug.co.il";
const NAME: &str = "bug";
const SELLER_NAME: &str = "BUG";

pub struct BugAdapter {
    ctx: AdapterContext,
    base_url: String,
}

impl BugAdapter {
    #[must_use]
    pub fn new(ctx: AdapterContext) -> Self {
        Self::with_base_url(ctx, BUG_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(ctx: AdapterContext, base_url: &str) -> Self {
        Self {
            ctx,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for BugAdapter {
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
        let url = search_url(&self.base_url, "/search?q=", query);
        let page = self
            .ctx
            .fetcher
            .get(&url, None)
            .await
            .ok_or(AdapterError::Unavailable {
                source_name: NAME,
                url: url.clone(),
            })?;

        let products: Vec<(String, String)> = parse_product_links(&page.body, &page.url)
            .into_iter()
            .filter(|(title, _)| is_relevant(query, title))
            .take(max_results)
            .collect();

        let website = origin_of(&self.base_url);
        let mut options = Vec::new();
        for (title, product_url) in products {
            let Some(product) = self.ctx.fetcher.get(&product_url, None).await else {
                continue;
            };
            let Some(found) = self.ctx.prices.extract(&product.body, &product.url) else {
                tracing::debug!(source = NAME, url = %product_url, "no price on product page");
                continue;
            };
            let seller = SellerInfo {
                name: SELLER_NAME.to_string(),
                website_url: website.clone(),
                whatsapp_number: None,
                country: self.country().to_string(),
                source_adapter: NAME.to_string(),
                reliability_score: None,
            };
            options.push(price_option(query, title, seller, found.price, product.url));
        }
        options.sort_by(|a, b| a.price.cmp(&b.price));

        tracing::info!(source = NAME, query, results = options.len(), "search complete");
        Ok(options)
    }
}

fn parse_product_links(html: &str, base: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let link_sel = selector(".product-cube a[href], a.product-link[href]");

    let mut seen = std::collections::HashSet::new();
    doc.select(&link_sel)
        .filter_map(|a| {
            let url = absolutize(base, a.value().attr("href")?)?;
            let title = a
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| text_of(a));
            (!title.is_empty()).then_some((title, url))
        })
        .filter(|(_, url)| seen.insert(url.clone()))
        .collect()
}
