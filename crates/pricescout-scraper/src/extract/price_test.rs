use super::*;

use std::str::FromStr;

fn extract(html: &str) -> Option<PriceResult> {
    PriceExtractor::default().extract(html, "https://shop.example/item")
}

fn price(html: &str) -> Option<Decimal> {
    extract(html).map(|r| r.price)
}

// ---------------------------------------------------------------------------
// Strategy priority
// ---------------------------------------------------------------------------

#[test]
fn jsonld_beats_conflicting_css_price() {
    let html = r#"
        <html><head>
        <script type="application/ld+json">
        {"@type":"Product","name":"TV","offers":{"@type":"Offer","price":"1299","priceCurrency":"ILS"}}
        </script>
        </head><body><span class="price">₪999</span></body></html>
    "#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from(1299));
    assert_eq!(result.strategy, PriceStrategy::JsonLd);
}

#[test]
fn microdata_content_attribute_wins_over_text() {
    let html = r#"<div itemscope><span itemprop="price" content="2450.00">₪ 2,450 כולל מע"מ</span></div>"#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from_str("2450.00").unwrap());
    assert_eq!(result.strategy, PriceStrategy::Microdata);
}

#[test]
fn meta_tags_are_used_when_no_structured_data() {
    let html = r#"<html><head><meta property="product:price:amount" content="899"></head>
        <body><p>text</p></body></html>"#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from(899));
    assert_eq!(result.strategy, PriceStrategy::MetaTag);
}

#[test]
fn out_of_bounds_strategy_falls_through_to_next() {
    let html = r#"
        <script type="application/ld+json">{"offers":{"price":"5"}}</script>
        <meta property="og:price:amount" content="1450">
    "#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from(1450));
    assert_eq!(result.strategy, PriceStrategy::MetaTag);
}

// ---------------------------------------------------------------------------
// CSS heuristic scan
// ---------------------------------------------------------------------------

#[test]
fn priority_selectors_run_before_general_scan() {
    let html = r#"
        <div class="product">
          <span class="price">₪1,999</span>
          <span class="price-current">₪1,499</span>
        </div>
    "#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from(1499));
    assert_eq!(result.strategy, PriceStrategy::CssPriority);
}

#[test]
fn old_price_and_installment_elements_are_excluded() {
    let html = r#"
        <div class="old-price"><span class="price">₪2,199</span></div>
        <div class="installments"><div><span class="price">₪120</span></div></div>
        <span class="price">₪1,899</span>
    "#;
    assert_eq!(price(html), Some(Decimal::from(1899)));
}

#[test]
fn exclusion_reaches_only_two_ancestor_levels() {
    let html = r#"
        <div class="related-products"><div><div><span class="price">₪700</span></div></div></div>
    "#;
    assert_eq!(price(html), Some(Decimal::from(700)));
}

#[test]
fn short_exclusion_words_match_whole_tokens_only() {
    let html = r#"<div class="header bold"><span class="price">₪640</span></div>"#;
    assert_eq!(price(html), Some(Decimal::from(640)));

    let html = r#"<div class="ad"><span class="price">₪640</span></div>"#;
    assert_eq!(extract(html).map(|r| r.strategy), Some(PriceStrategy::RegexFallback));
}

#[test]
fn shipping_text_is_skipped_even_when_selector_matches() {
    let html = r#"
        <span class="price-note">Free shipping over ₪300</span>
        <span class="price">₪1,050</span>
    "#;
    assert_eq!(price(html), Some(Decimal::from(1050)));
}

#[test]
fn data_price_attribute_is_read_directly() {
    let html = r#"<button data-price="3200">הוסף לסל</button>"#;
    let result = extract(html).unwrap();
    assert_eq!(result.price, Decimal::from(3200));
    assert_eq!(result.strategy, PriceStrategy::CssPriority);
}

// ---------------------------------------------------------------------------
// Regex fallback and false-positive rejection
// ---------------------------------------------------------------------------

#[test]
fn installment_amount_is_never_the_price() {
    let result = extract("36 payments of ₪100 ... Total: ₪3,600").unwrap();
    assert_eq!(result.price, Decimal::from(3600));
    assert_eq!(result.strategy, PriceStrategy::RegexFallback);
}

#[test]
fn hebrew_installments_are_rejected() {
    let html = "<p>₪150 לחודש</p><p>מחיר: 5,400 ש\"ח</p>";
    assert_eq!(price(html), Some(Decimal::from(5400)));
}

#[test]
fn bare_numbers_are_never_prices() {
    let html = "<p>Warranty 3 years, rated 4.8 by 1200 buyers, model 2024</p>";
    assert_eq!(price(html), None);
}

#[test]
fn currency_variants_are_recognised() {
    assert_eq!(price("<p>1,250 ₪</p>"), Some(Decimal::from(1250)));
    assert_eq!(price("<p>ILS 780</p>"), Some(Decimal::from(780)));
    assert_eq!(price("<p>999 ש״ח</p>"), Some(Decimal::from(999)));
}

#[test]
fn script_text_is_ignored_by_fallback() {
    let html = "<script>var p = '₪75';</script><p>no price here</p>";
    assert_eq!(price(html), None);
}

// ---------------------------------------------------------------------------
// Sanity bounds
// ---------------------------------------------------------------------------

#[test]
fn values_outside_bounds_are_rejected() {
    assert_eq!(price("₪0.50"), None);
    assert_eq!(price("₪2,000,000"), None);
}

#[test]
fn boundary_values_are_accepted() {
    assert_eq!(price("₪50"), Some(Decimal::from(50)));
    assert_eq!(price("₪500,000"), Some(Decimal::from(500_000)));
}

#[test]
fn custom_bounds_apply() {
    let extractor = PriceExtractor::new(Decimal::from(10), Decimal::from(100));
    assert_eq!(
        extractor.extract("₪75", "https://x.example").map(|r| r.price),
        Some(Decimal::from(75))
    );
    assert!(extractor.extract("₪750", "https://x.example").is_none());
}

#[test]
fn confidence_is_ordinal_across_strategies() {
    let ranks: Vec<f32> = PriceStrategy::ORDER.iter().map(|s| s.confidence()).collect();
    assert!(ranks.windows(2).all(|w| w[0] > w[1]));
}
