//! schema.org JSON-LD helpers used by the price and contact engines.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::number::json_amount;

/// Objects nested deeper than this are never inspected.
pub(crate) const MAX_JSONLD_DEPTH: usize = 5;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const BUSINESS_TYPES: &[&str] = &[
    "LocalBusiness",
    "Organization",
    "Store",
    "ElectronicsStore",
    "OnlineStore",
    "Corporation",
];

/// Every parseable JSON-LD document in `html`, with top-level arrays and
/// `@graph` containers flattened into individual nodes.
pub(crate) fn jsonld_nodes(html: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(text) = cap.get(1) else { continue };
        let Ok(value) = serde_json::from_str::<Value>(text.as_str().trim()) else {
            continue;
        };

        let top: Vec<Value> = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        for item in top {
            let graph = item.get("@graph").and_then(Value::as_array).cloned();
            nodes.push(item);
            if let Some(graph) = graph {
                nodes.extend(graph);
            }
        }
    }
    nodes
}

/// Price candidates from a JSON-LD node in traversal order.
///
/// At each object, `offers` (`price`, then `lowPrice`, then
/// `priceSpecification.price`) is read before the object's own `price`
/// field, and only then are children visited. Recursion stops below
/// [`MAX_JSONLD_DEPTH`].
pub(crate) fn offer_prices(node: &Value) -> Vec<Decimal> {
    let mut out = Vec::new();
    collect_prices(node, 0, &mut out);
    out
}

fn collect_prices(node: &Value, depth: usize, out: &mut Vec<Decimal>) {
    if depth > MAX_JSONLD_DEPTH {
        return;
    }
    match node {
        Value::Array(items) => {
            for item in items {
                collect_prices(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            if let Some(offers) = map.get("offers") {
                let offers: Vec<&Value> = match offers {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for offer in offers {
                    for field in ["price", "lowPrice"] {
                        if let Some(price) = offer.get(field).and_then(json_amount) {
                            out.push(price);
                        }
                    }
                    if let Some(price) = offer
                        .get("priceSpecification")
                        .and_then(|spec| spec.get("price"))
                        .and_then(json_amount)
                    {
                        out.push(price);
                    }
                }
            }
            if let Some(price) = map.get("price").and_then(json_amount) {
                out.push(price);
            }
            for (key, value) in map {
                if key != "offers" && (value.is_object() || value.is_array()) {
                    collect_prices(value, depth + 1, out);
                }
            }
        }
        _ => {}
    }
}

/// `telephone` values of business/organization nodes.
pub(crate) fn business_telephones(node: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_telephones(node, 0, &mut out);
    out
}

fn collect_telephones(node: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_JSONLD_DEPTH {
        return;
    }
    match node {
        Value::Array(items) => {
            for item in items {
                collect_telephones(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            if is_business(node) {
                if let Some(phone) = map.get("telephone").and_then(Value::as_str) {
                    out.push(phone.to_string());
                }
            }
            for value in map.values() {
                if value.is_object() || value.is_array() {
                    collect_telephones(value, depth + 1, out);
                }
            }
        }
        _ => {}
    }
}

/// `name` of the first business/organization node in `html`.
pub(crate) fn jsonld_site_name(html: &str) -> Option<String> {
    jsonld_nodes(html)
        .iter()
        .filter(|node| is_business(node))
        .filter_map(|node| node.get("name").and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// `@type` may be a plain string or an array of strings.
fn is_business(node: &Value) -> bool {
    let matches = |s: &str| BUSINESS_TYPES.iter().any(|t| s.eq_ignore_ascii_case(t));
    match node.get("@type") {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}
