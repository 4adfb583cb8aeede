//! Helpers shared by the site adapters.

use std::sync::LazyLock;

use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pricescout_core::{PriceOption, SellerInfo};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use super::AdapterContext;
use crate::extract::jsonld_site_name;
use crate::origin::{domain_label, host_of, origin_of};

pub(super) const CURRENCY_ILS: &str = "ILS";

static OG_SITE_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:site_name"]"#).expect("valid selector")
});
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// `{base}{path}{query-encoded}`, with the query percent-encoded.
pub(super) fn search_url(base: &str, path_and_param: &str, query: &str) -> String {
    format!(
        "{}{}{}",
        base.trim_end_matches('/'),
        path_and_param,
        utf8_percent_encode(query.trim(), NON_ALPHANUMERIC)
    )
}

/// Element text with runs of whitespace collapsed.
pub(super) fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

pub(super) fn price_option(
    query: &str,
    title: String,
    seller: SellerInfo,
    price: Decimal,
    url: String,
) -> PriceOption {
    PriceOption {
        product_query: query.to_string(),
        title,
        seller,
        price,
        currency: CURRENCY_ILS.to_string(),
        url,
        scraped_at: Utc::now(),
    }
}

/// Display name for a site: `og:site_name`, JSON-LD organization name, the
/// first segment of `<title>`, or the domain label.
pub(super) fn site_name(html: &str, url: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let og = doc
        .select(&OG_SITE_NAME)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string);
    if og.is_some() {
        return og;
    }
    if let Some(name) = jsonld_site_name(html) {
        return Some(name);
    }
    let title = doc
        .select(&TITLE)
        .next()
        .map(text_of)
        .and_then(|t| {
            t.split(['|', '-', '–', '»'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_string)
        });
    title.or_else(|| host_of(url).and_then(|h| domain_label(&h)))
}

pub(crate) async fn fetch_contact(ctx: &AdapterContext, url: &str) -> Option<String> {
    let page = ctx.fetcher.get(url, None).await?;
    ctx.contacts.extract(&page.body, &page.url).await
}

pub(crate) async fn fetch_seller_details(
    ctx: &AdapterContext,
    adapter: &str,
    country: &str,
    url: &str,
) -> Option<SellerInfo> {
    let page = ctx.fetcher.get(url, None).await?;
    let name = site_name(&page.body, &page.url)?;
    let whatsapp_number = ctx.contacts.extract(&page.body, &page.url).await;
    Some(SellerInfo {
        name,
        website_url: origin_of(&page.url),
        whatsapp_number,
        country: country.to_string(),
        source_adapter: adapter.to_string(),
        reliability_score: None,
    })
}
