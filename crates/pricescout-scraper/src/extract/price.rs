//! Multi-strategy price extraction.
//!
//! Strategies run in a fixed order and the first one that yields a candidate
//! inside the configured sanity bounds wins. Each strategy may produce
//! several candidates; out-of-bounds candidates are discarded and the next
//! candidate (then the next strategy) is tried.

use std::sync::LazyLock;

use pricescout_core::AppConfig;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::jsonld::{jsonld_nodes, offer_prices};
use super::number::{first_amount, AMOUNT_PATTERN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrategy {
    JsonLd,
    Microdata,
    MetaTag,
    CssPriority,
    CssGeneral,
    RegexFallback,
}

impl PriceStrategy {
    pub const ORDER: [PriceStrategy; 6] = [
        Self::JsonLd,
        Self::Microdata,
        Self::MetaTag,
        Self::CssPriority,
        Self::CssGeneral,
        Self::RegexFallback,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JsonLd => "json_ld",
            Self::Microdata => "microdata",
            Self::MetaTag => "meta_tag",
            Self::CssPriority => "css_priority",
            Self::CssGeneral => "css_general",
            Self::RegexFallback => "regex_fallback",
        }
    }

    /// Ordinal rank of the strategy, not a probability.
    #[must_use]
    pub const fn confidence(self) -> f32 {
        match self {
            Self::JsonLd => 0.95,
            Self::Microdata => 0.9,
            Self::MetaTag => 0.85,
            Self::CssPriority => 0.75,
            Self::CssGeneral => 0.6,
            Self::RegexFallback => 0.4,
        }
    }
}

impl std::fmt::Display for PriceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceResult {
    pub price: Decimal,
    pub confidence: f32,
    pub strategy: PriceStrategy,
}

// --- Heuristic vocabularies ---------------------------------------------

/// Class/id fragments marking a price element as not the selling price.
/// Matched as substrings of the lowercased class and id attributes.
const EXCLUDED_CLASS_FRAGMENTS: &[&str] = &[
    "original",
    "discount",
    "save",
    "shipping",
    "delivery",
    "installment",
    "payment",
    "monthly",
    "related",
    "recommend",
    "promo",
];

/// Short exclusion words, matched only as whole class/id tokens so that
/// `ad` does not hit `header` and `old` does not hit `bold`.
const EXCLUDED_CLASS_TOKENS: &[&str] = &["old", "was", "ad", "ads"];

/// Class fragments that mark the current selling price.
const PRIORITY_CLASS_FRAGMENTS: &[&str] = &["current", "final", "sale", "now", "special"];

/// Text around an amount that means it is a shipping fee, threshold or
/// installment rather than the product price.
const SHIPPING_PAYMENT_KEYWORDS: &[&str] = &[
    "shipping",
    "delivery",
    "payment",
    "installment",
    "monthly",
    "per month",
    "/month",
    "משלוח",
    "תשלום",
    "לחודש",
    "חודשי",
];

/// How far from an amount the regex fallback looks for keywords.
const LEAD_IN_CHARS: usize = 30;
const TRAIL_CHARS: usize = 20;

/// CSS candidates with longer text are containers, not price labels.
const MAX_CSS_TEXT_CHARS: usize = 80;

static PRICE_ELEMENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".price, [class*=price], [class*=Price], [id*=price], [data-price]")
        .expect("valid selector")
});
static MICRODATA_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop="price"]"#).expect("valid selector"));
static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"meta[property="product:price:amount"], meta[property="og:price:amount"], meta[name="product:price:amount"]"#,
    )
    .expect("valid selector")
});

static CURRENCY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"₪\s*{AMOUNT_PATTERN}"),
        format!(r"{AMOUNT_PATTERN}\s*₪"),
        format!(r#"{AMOUNT_PATTERN}\s*ש(?:״|"|''|')ח"#),
        format!(r"(?i)\b(?:ILS|NIS)\s*{AMOUNT_PATTERN}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

// --- Engine ----------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PriceExtractor {
    min_price: Decimal,
    max_price: Decimal,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new(Decimal::from(50), Decimal::from(500_000))
    }
}

impl PriceExtractor {
    #[must_use]
    pub fn new(min_price: Decimal, max_price: Decimal) -> Self {
        Self {
            min_price,
            max_price,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            Decimal::from(config.price_min),
            Decimal::from(config.price_max),
        )
    }

    /// Inclusive sanity bound check.
    #[must_use]
    pub fn in_bounds(&self, price: Decimal) -> bool {
        price >= self.min_price && price <= self.max_price
    }

    /// Extracts the product price from `html`. `url` is used for logging.
    #[must_use]
    pub fn extract(&self, html: &str, url: &str) -> Option<PriceResult> {
        let doc = Html::parse_document(html);

        for strategy in PriceStrategy::ORDER {
            let candidates = match strategy {
                PriceStrategy::JsonLd => jsonld_candidates(html),
                PriceStrategy::Microdata => microdata_candidates(&doc),
                PriceStrategy::MetaTag => meta_candidates(&doc),
                PriceStrategy::CssPriority => css_candidates(&doc, true),
                PriceStrategy::CssGeneral => css_candidates(&doc, false),
                PriceStrategy::RegexFallback => regex_candidates(&visible_text(&doc)),
            };
            if candidates.is_empty() {
                continue;
            }
            match candidates.iter().copied().find(|p| self.in_bounds(*p)) {
                Some(price) => {
                    tracing::debug!(url, strategy = %strategy, %price, "price extracted");
                    return Some(PriceResult {
                        price,
                        confidence: strategy.confidence(),
                        strategy,
                    });
                }
                None => tracing::debug!(
                    url,
                    strategy = %strategy,
                    candidates = candidates.len(),
                    "all price candidates outside sanity bounds"
                ),
            }
        }

        tracing::debug!(url, "no price found");
        None
    }
}

// --- Strategies ------------------------------------------------------------

fn jsonld_candidates(html: &str) -> Vec<Decimal> {
    jsonld_nodes(html).iter().flat_map(offer_prices).collect()
}

fn microdata_candidates(doc: &Html) -> Vec<Decimal> {
    doc.select(&MICRODATA_SELECTOR)
        .filter_map(|el| match el.value().attr("content") {
            Some(content) => first_amount(content),
            None => first_amount(&element_text(el)),
        })
        .collect()
}

fn meta_candidates(doc: &Html) -> Vec<Decimal> {
    doc.select(&META_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .filter_map(first_amount)
        .collect()
}

/// Heuristic element scan. `priority` selects the current/final/sale
/// subset; the general pass takes everything else.
fn css_candidates(doc: &Html, priority: bool) -> Vec<Decimal> {
    doc.select(&PRICE_ELEMENT_SELECTOR)
        .filter(|el| is_priority_element(*el) == priority)
        .filter(|el| !is_excluded(*el))
        .filter_map(|el| {
            if let Some(amount) = el.value().attr("data-price").and_then(first_amount) {
                return Some(amount);
            }
            let text = element_text(el);
            if text.chars().count() > MAX_CSS_TEXT_CHARS || mentions_shipping_or_payment(&text) {
                return None;
            }
            first_amount(&text)
        })
        .collect()
}

/// Currency-anchored amounts from plain text, in document order. Bare
/// numbers are never candidates.
fn regex_candidates(text: &str) -> Vec<Decimal> {
    let mut matches: Vec<(usize, usize, Decimal)> = CURRENCY_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let amount = super::number::parse_amount(cap.get(1)?.as_str())?;
            Some((whole.start(), whole.end(), amount))
        })
        .collect();
    matches.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));

    let mut deduped: Vec<(usize, usize, Decimal)> = Vec::with_capacity(matches.len());
    for m in matches {
        if deduped.last().is_some_and(|last| m.0 < last.1) {
            continue;
        }
        deduped.push(m);
    }

    // A keyword in the gap between two amounts belongs to the nearer one:
    // "₪150 לחודש, מחיר 5,400 ₪" rejects 150 and keeps 5,400.
    let n = deduped.len();
    let mut rejected = vec![false; n];
    for i in 0..=n {
        let gap_start = if i == 0 { 0 } else { deduped[i - 1].1 };
        let gap_end = if i == n { text.len() } else { deduped[i].0 };
        let gap = text[gap_start..gap_end].to_lowercase();
        let gap_len = gap.chars().count();
        for (kw_start, kw_end) in keyword_spans(&gap) {
            let dist_prev = kw_start;
            let dist_next = gap_len - kw_end;
            let to_prev = i > 0 && (i == n || dist_prev < dist_next);
            if to_prev {
                if dist_prev < TRAIL_CHARS {
                    rejected[i - 1] = true;
                }
            } else if i < n && dist_next < LEAD_IN_CHARS {
                rejected[i] = true;
            }
        }
    }

    deduped
        .into_iter()
        .zip(rejected)
        .filter(|(_, rejected)| !rejected)
        .map(|((_, _, amount), _)| amount)
        .collect()
}

/// Char-offset spans of shipping/payment keywords in already-lowercased text.
fn keyword_spans(lower: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    for keyword in SHIPPING_PAYMENT_KEYWORDS {
        for (byte_idx, _) in lower.match_indices(keyword) {
            let start = lower[..byte_idx].chars().count();
            spans.push((start, start + keyword.chars().count()));
        }
    }
    spans
}

// --- Helpers ---------------------------------------------------------------

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn class_and_id(el: ElementRef<'_>) -> String {
    let mut s = el.value().attr("class").unwrap_or_default().to_lowercase();
    if let Some(id) = el.value().id() {
        s.push(' ');
        s.push_str(&id.to_lowercase());
    }
    s
}

fn is_priority_element(el: ElementRef<'_>) -> bool {
    if el.value().attr("data-price").is_some() {
        return true;
    }
    let attrs = class_and_id(el);
    PRIORITY_CLASS_FRAGMENTS.iter().any(|f| attrs.contains(f))
}

fn has_excluded_marker(attrs: &str) -> bool {
    if EXCLUDED_CLASS_FRAGMENTS.iter().any(|f| attrs.contains(f)) {
        return true;
    }
    attrs
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| EXCLUDED_CLASS_TOKENS.contains(&token))
}

/// Checks the element itself and its two nearest element ancestors.
fn is_excluded(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap).take(2))
        .any(|e| has_excluded_marker(&class_and_id(e)))
}

fn mentions_shipping_or_payment(text: &str) -> bool {
    let lower = text.to_lowercase();
    SHIPPING_PAYMENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Text content outside `<script>`, `<style>`, `<noscript>` and `<template>`.
pub(crate) fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.parent().and_then(ElementRef::wrap).is_some_and(|p| {
            matches!(p.value().name(), "script" | "style" | "noscript" | "template")
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
