//! wisebuy.co.il: price-comparison portal with `/redir/` outbound links.

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

pub const WISEBUY_BASE_URL: &str = "https://www.wisebuy.co.il";
const NAME: &str = "wisebuy";

#[derive(Debug, Clone, PartialEq)]
struct Offer {
    title: String,
    seller: String,
    price: Decimal,
    link: String,
}

pub struct WisebuyAdapter {
    ctx: AdapterContext,
    base_url: String,
}

impl WisebuyAdapter {
    #[must_use]
    pub fn new(ctx: AdapterContext) -> Self {
        Self::with_base_url(ctx, WISEBUY_BASE_URL)
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
impl SourceAdapter for WisebuyAdapter {
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

        let mut offers: Vec<Offer> = parse_offers(&page.body, &page.url)
            .into_iter()
            .filter(|o| is_relevant(query, &o.title) && self.ctx.prices.in_bounds(o.price))
            .collect();
        offers.sort_by(|a, b| a.price.cmp(&b.price));
        offers.truncate(max_results.saturating_mul(2));

        let links: Vec<String> = offers.iter().map(|o| o.link.clone()).collect();
        let resolutions = self.ctx.resolver.resolve_many(&links).await;

        let mut options: Vec<PriceOption> = offers
            .into_iter()
            .zip(resolutions)
            .filter(|(_, res)| res.resolved)
            .map(|(offer, res)| {
                let seller = SellerInfo {
                    name: offer.seller,
                    website_url: origin_of(&res.url),
                    whatsapp_number: None,
                    country: self.country().to_string(),
                    source_adapter: NAME.to_string(),
                    reliability_score: None,
                };
                price_option(query, offer.title, seller, offer.price, res.url)
            })
            .collect();
        options.truncate(max_results);

        tracing::info!(source = NAME, query, results = options.len(), "search complete");
        Ok(options)
    }
}

fn parse_offers(html: &str, base: &str) -> Vec<Offer> {
    let doc = Html::parse_document(html);
    let row_sel = selector(".product-offer, .offer-row");
    let title_sel = selector(".product-title, h2, h3");
    let store_sel = selector(".store-name, .shop-name");
    let price_sel = selector(".offer-price, .price");
    let link_sel = selector(r#"a[href*="/redir/"]"#);

    doc.select(&row_sel)
        .filter_map(|row| {
            let title = row.select(&title_sel).next().map(text_of)?;
            let seller = row
                .value()
                .attr("data-store")
                .map(str::to_string)
                .or_else(|| row.select(&store_sel).next().map(text_of))
                .filter(|s| !s.is_empty())?;
            let price = row
                .select(&price_sel)
                .find_map(|el| first_amount(&text_of(el)))?;
            let link = row
                .select(&link_sel)
                .find_map(|a| absolutize(base, a.value().attr("href")?))?;
            Some(Offer {
                title,
                seller,
                price,
                link,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offers_require_title_seller_price_and_redirect_link() {
        let html = r#"
            <div class="product-offer" data-store="Ivory">
              <h3 class="product-title">Samsung UE55AU7100</h3>
              <span class="offer-price">₪2,290</span>
              <a href="/redir/9001">לחנות</a>
            </div>
            <div class="offer-row">
              <h3>Samsung UE55AU7100</h3>
              <span class="shop-name">Bug</span>
              <span class="price">₪2,310</span>
              <a href="https://bug.co.il/direct">direct</a>
            </div>
        "#;
        let offers = parse_offers(html, "https://www.wisebuy.co.il/search?q=x");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].seller, "Ivory");
        assert_eq!(offers[0].price, Decimal::from(2290));
        assert_eq!(offers[0].link, "https://www.wisebuy.co.il/redir/9001");
    }
}
