use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Seller identity as observed on a source page.
///
/// `name` is the raw string seen on the page; the canonical key used to
/// merge sellers across sources is derived on demand and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub name: String,
    pub website_url: Option<String>,
    /// Normalized `+<country-code><national-number>` form.
    pub whatsapp_number: Option<String>,
    /// ISO 3166-1 alpha-2 code, e.g. `"IL"`.
    pub country: String,
    /// Name of the source adapter that observed this seller.
    pub source_adapter: String,
    pub reliability_score: Option<f64>,
}

/// One listing found by a source adapter for a product query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOption {
    pub product_query: String,
    /// Listing title as shown by the source, used for relevance filtering.
    pub title: String,
    pub seller: SellerInfo,
    pub price: Decimal,
    /// ISO 4217 currency code, e.g. `"ILS"`.
    pub currency: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

/// All listings from one canonical seller across a set of queries.
///
/// Holds at most one [`PriceOption`] per distinct query (the cheapest), and
/// `matched_queries` never contains duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerAggregation {
    pub canonical_seller_name: String,
    pub display_name: String,
    pub products: Vec<PriceOption>,
    pub matched_queries: Vec<String>,
    pub total_price: Decimal,
    pub average_rating: Option<f64>,
    pub contact: Option<String>,
}

impl SellerAggregation {
    /// Number of distinct requested products this seller carries.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
