use super::*;

use chrono::Utc;
use pricescout_core::SellerInfo;

fn option(query: &str, seller: &str, price: i64) -> PriceOption {
    PriceOption {
        product_query: query.to_string(),
        title: query.to_string(),
        seller: SellerInfo {
            name: seller.to_string(),
            website_url: None,
            whatsapp_number: None,
            country: "IL".to_string(),
            source_adapter: "test".to_string(),
            reliability_score: None,
        },
        price: Decimal::from(price),
        currency: "ILS".to_string(),
        url: format!("https://www.zap.co.il/fs.aspx?s={seller}"),
        scraped_at: Utc::now(),
    }
}

fn run(results: Vec<(&str, Vec<PriceOption>)>, top_n: usize) -> Vec<SellerAggregation> {
    let owned: Vec<(String, Vec<PriceOption>)> = results
        .into_iter()
        .map(|(q, o)| (q.to_string(), o))
        .collect();
    aggregate(&SellerNormalizer::default(), &owned, top_n)
}

#[test]
fn bundle_seller_outranks_cheaper_single_item_seller() {
    let sellers = run(
        vec![
            ("tv", vec![option("tv", "Store A", 1000), option("tv", "Store B", 100)]),
            ("soundbar", vec![option("soundbar", "Store A", 500)]),
        ],
        10,
    );
    assert_eq!(sellers.len(), 2);
    assert_eq!(sellers[0].canonical_seller_name, "storea");
    assert_eq!(sellers[0].product_count(), 2);
    assert_eq!(sellers[0].total_price, Decimal::from(1500));
    assert_eq!(sellers[1].canonical_seller_name, "storeb");
}

#[test]
fn lowest_price_per_query_is_kept_not_summed() {
    let sellers = run(
        vec![(
            "fridge",
            vec![option("fridge", "Ivory", 1200), option("fridge", "Ivory", 1000)],
        )],
        10,
    );
    assert_eq!(sellers.len(), 1);
    assert_eq!(sellers[0].total_price, Decimal::from(1000));
    assert_eq!(sellers[0].products.len(), 1);
    assert_eq!(sellers[0].matched_queries, vec!["fridge".to_string()]);
}

#[test]
fn spelling_variants_merge_into_one_seller() {
    let sellers = run(
        vec![
            ("tv", vec![option("tv", "אבי סופר", 2000)]),
            ("oven", vec![option("oven", "SOFERAVI", 900)]),
        ],
        10,
    );
    assert_eq!(sellers.len(), 1);
    assert_eq!(sellers[0].canonical_seller_name, "soferavi");
    assert_eq!(sellers[0].display_name, "אבי סופר");
    assert_eq!(sellers[0].matched_queries, vec!["tv".to_string(), "oven".to_string()]);
}

#[test]
fn ratings_average_and_first_contact_wins() {
    let mut a = option("tv", "KSP", 1000);
    a.seller.reliability_score = Some(4.0);
    let mut b = option("oven", "KSP", 800);
    b.seller.reliability_score = Some(5.0);
    b.seller.whatsapp_number = Some("+972501111111".to_string());
    let mut c = option("phone", "KSP", 700);
    c.seller.whatsapp_number = Some("+972502222222".to_string());

    let sellers = run(vec![("tv", vec![a]), ("oven", vec![b]), ("phone", vec![c])], 10);
    assert_eq!(sellers[0].average_rating, Some(4.5));
    assert_eq!(sellers[0].contact.as_deref(), Some("+972501111111"));
}

#[test]
fn equal_counts_rank_by_total_then_truncate() {
    let sellers = run(
        vec![(
            "tv",
            vec![
                option("tv", "Gamma", 1300),
                option("tv", "Alpha", 1100),
                option("tv", "Beta", 1200),
            ],
        )],
        2,
    );
    let names: Vec<&str> = sellers.iter().map(|s| s.canonical_seller_name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}
