//! zap.co.il: price-comparison portal.
//!
//! Two levels: the search page links to model pages, and each model page
//! lists store rows whose outbound links go through `/fs.aspx` affiliate
//! redirects. Those links are resolved in one batch and rows that cannot
//! be resolved past an aggregator are dropped.

use async_trait::async_trait;
use pricescout_core::{PriceOption, SellerInfo};
use rust_decimal::Decimal;
use scraper::Html;

use super::common::{price_option, search_url, selector, text_of};
use super::relevance::is_relevant;
use super::{AdapterContext, SourceAdapter};
use crate::error::AdapterError;
use crate::extract::first_amount;
use crate::origin::{absolutize, origin_of};

pub const ZAP_BASE_URL: &str = "https://www.zap.co.il";
const NAME: &str = "zap";
const MAX_MODEL_PAGES: usize = 3;

/// A store row on a model page, before its link is resolved.
#[derive(Debug, Clone, PartialEq)]
struct StoreRow {
    title: String,
    seller: String,
    price: Decimal,
    link: String,
    rating: Option<f64>,
}

pub struct ZapAdapter {
    ctx: AdapterContext,
    base_url: String,
}

impl ZapAdapter {
    #[must_use]
    pub fn new(ctx: AdapterContext) -> Self {
        Self::with_base_url(ctx, ZAP_BASE_URL)
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
impl SourceAdapter for ZapAdapter {
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
        let url = search_url(&self.base_url, "/search.aspx?keyword=", query);
        let page = self
            .ctx
            .fetcher
            .get(&url, None)
            .await
            .ok_or(AdapterError::Unavailable {
                source_name: NAME,
                url: url.clone(),
            })?;

        let models: Vec<(String, String)> = parse_model_links(&page.body, &page.url)
            .into_iter()
            .filter(|(title, _)| is_relevant(query, title))
            .take(MAX_MODEL_PAGES)
            .collect();
        tracing::debug!(source = NAME, query, models = models.len(), "model pages found");

        let mut rows = Vec::new();
        for (title, model_url) in &models {
            let Some(model_page) = self.ctx.fetcher.get(model_url, None).await else {
                continue;
            };
            rows.extend(parse_store_rows(&model_page.body, &model_page.url, title));
        }

        rows.retain(|row| self.ctx.prices.in_bounds(row.price));
        rows.sort_by(|a, b| a.price.cmp(&b.price));
        // Resolution costs a request per row; bound it before fanning out.
        rows.truncate(max_results.saturating_mul(2));

        let links: Vec<String> = rows.iter().map(|r| r.link.clone()).collect();
        let resolutions = self.ctx.resolver.resolve_many(&links).await;

        let mut options: Vec<PriceOption> = rows
            .into_iter()
            .zip(resolutions)
            .filter(|(_, res)| res.resolved)
            .map(|(row, res)| {
                let seller = SellerInfo {
                    name: row.seller,
                    website_url: origin_of(&res.url),
                    whatsapp_number: None,
                    country: self.country().to_string(),
                    source_adapter: NAME.to_string(),
                    reliability_score: row.rating,
                };
                price_option(query, row.title, seller, row.price, res.url)
            })
            .collect();
        options.truncate(max_results);

        tracing::info!(source = NAME, query, results = options.len(), "search complete");
        Ok(options)
    }
}

/// `(title, absolute url)` of every distinct model page linked from a
/// search results page, in page order.
fn parse_model_links(html: &str, base: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let links = selector(r#"a[href*="model.aspx"]"#);

    let mut seen = std::collections::HashSet::new();
    doc.select(&links)
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

fn parse_store_rows(html: &str, base: &str, fallback_title: &str) -> Vec<StoreRow> {
    let doc = Html::parse_document(html);
    let row_sel = selector(".compare-item-row, .StoreRow, [data-site-name]");
    let name_sel = selector(".store-name, .StoreName, .compare-item-store img[alt]");
    let price_sel = selector(".price-wrapper, .price, [class*=Price]");
    let link_sel = selector(r#"a[href*="fs.aspx"], a[href*="/redir"]"#);
    let h1_sel = selector("h1");

    let title = doc
        .select(&h1_sel)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string());

    doc.select(&row_sel)
        .filter_map(|row| {
            let seller = row
                .value()
                .attr("data-site-name")
                .map(str::to_string)
                .or_else(|| {
                    row.select(&name_sel).next().map(|el| {
                        el.value()
                            .attr("alt")
                            .map_or_else(|| text_of(el), str::to_string)
                    })
                })
                .filter(|s| !s.trim().is_empty())?;
            let price = row
                .value()
                .attr("data-price")
                .and_then(first_amount)
                .or_else(|| row.select(&price_sel).find_map(|el| first_amount(&text_of(el))))?;
            let link = row
                .select(&link_sel)
                .find_map(|a| absolutize(base, a.value().attr("href")?))?;
            let rating = row
                .value()
                .attr("data-rating")
                .and_then(|r| r.trim().parse::<f64>().ok());
            Some(StoreRow {
                title: title.clone(),
                seller: seller.trim().to_string(),
                price,
                link,
                rating,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_PAGE: &str = r#"
        <h1>Samsung UE55AU7100</h1>
        <div class="compare-item-row" data-site-name="סופר אבי" data-rating="4.5">
          <div class="price-wrapper"><span>2,390 ₪</span></div>
          <a class="go-to-store" href="/fs.aspx?pid=111&amp;sog=e">לחנות</a>
        </div>
        <div class="compare-item-row">
          <span class="store-name">KSP</span>
          <div class="price-wrapper">2,450 ₪</div>
          <a href="/fs.aspx?pid=222">לחנות</a>
        </div>
        <div class="compare-item-row"><span class="store-name">No link</span><div class="price">999 ₪</div></div>
    "#;

    #[test]
    fn store_rows_parse_seller_price_link_and_rating() {
        let rows = parse_store_rows(MODEL_PAGE, "https://www.zap.co.il/model.aspx?modelid=1", "x");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seller, "סופר אבי");
        assert_eq!(rows[0].price, Decimal::from(2390));
        assert_eq!(rows[0].link, "https://www.zap.co.il/fs.aspx?pid=111&sog=e");
        assert_eq!(rows[0].rating, Some(4.5));
        assert_eq!(rows[0].title, "Samsung UE55AU7100");
        assert_eq!(rows[1].seller, "KSP");
        assert_eq!(rows[1].rating, None);
    }

    #[test]
    fn model_links_are_deduplicated() {
        let html = r#"
            <a href="/model.aspx?modelid=1" title="Samsung UE55AU7100"><img></a>
            <a href="/model.aspx?modelid=1">Samsung UE55AU7100</a>
            <a href="/model.aspx?modelid=2">LG 55UR7300</a>
        "#;
        let links = parse_model_links(html, "https://www.zap.co.il/search.aspx");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "Samsung UE55AU7100");
        assert_eq!(links[1].1, "https://www.zap.co.il/model.aspx?modelid=2");
    }
}
