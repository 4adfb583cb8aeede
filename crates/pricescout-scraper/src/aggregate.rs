//! Cross-query seller aggregation ("bundle discovery").

use std::collections::HashMap;

use pricescout_core::{PriceOption, SellerAggregation};
use rust_decimal::Decimal;

use crate::seller::SellerNormalizer;

struct Group {
    key: String,
    display_name: String,
    /// One entry per query, holding the cheapest listing seen.
    products: Vec<(String, PriceOption)>,
    ratings: Vec<f64>,
    contact: Option<String>,
}

impl Group {
    fn offer(&mut self, query: &str, option: &PriceOption) {
        match self.products.iter_mut().find(|(q, _)| q == query) {
            Some((_, kept)) if option.price < kept.price => *kept = option.clone(),
            Some(_) => {}
            None => self.products.push((query.to_string(), option.clone())),
        }
        if let Some(score) = option.seller.reliability_score {
            self.ratings.push(score);
        }
        if self.contact.is_none() {
            self.contact.clone_from(&option.seller.whatsapp_number);
        }
    }

    fn finish(self) -> SellerAggregation {
        let total_price: Decimal = self.products.iter().map(|(_, o)| o.price).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_rating = (!self.ratings.is_empty())
            .then(|| self.ratings.iter().sum::<f64>() / self.ratings.len() as f64);
        let (matched_queries, products) = self.products.into_iter().unzip();
        SellerAggregation {
            canonical_seller_name: self.key,
            display_name: self.display_name,
            products,
            matched_queries,
            total_price,
            average_rating,
            contact: self.contact,
        }
    }
}

/// Groups listings by canonical seller and ranks sellers by how much of
/// the requested bundle they carry.
///
/// Within one seller and query only the cheapest listing is kept. Sellers
/// are ordered by product count (descending), then total price
/// (ascending), then canonical name. At most `top_n` are returned.
#[must_use]
pub fn aggregate(
    normalizer: &SellerNormalizer,
    results_by_query: &[(String, Vec<PriceOption>)],
    top_n: usize,
) -> Vec<SellerAggregation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for (query, options) in results_by_query {
        for option in options {
            let url = option
                .seller
                .website_url
                .as_deref()
                .unwrap_or(option.url.as_str());
            let key = normalizer.normalize(&option.seller.name, Some(url));
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(Group {
                    key,
                    display_name: option.seller.name.clone(),
                    products: Vec::new(),
                    ratings: Vec::new(),
                    contact: None,
                });
                groups.len() - 1
            });
            groups[slot].offer(query, option);
        }
    }

    let mut sellers: Vec<SellerAggregation> = groups.into_iter().map(Group::finish).collect();
    sellers.sort_by(|a, b| {
        b.product_count()
            .cmp(&a.product_count())
            .then_with(|| a.total_price.cmp(&b.total_price))
            .then_with(|| a.canonical_seller_name.cmp(&b.canonical_seller_name))
    });
    sellers.truncate(top_n);
    sellers
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
