//! Numeric amount parsing shared by the price strategies.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// An amount with optional thousands separators and up to two decimals:
/// `3600`, `3,600`, `3,600.50`. Kept as a fragment so the currency-anchored
/// patterns can embed it.
pub(crate) const AMOUNT_PATTERN: &str = r"((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)";

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AMOUNT_PATTERN).expect("valid regex"));

/// Parses one amount token such as `"3,600.50"`.
pub(crate) fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned: String = token.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// First amount appearing anywhere in `text`.
pub(crate) fn first_amount(text: &str) -> Option<Decimal> {
    AMOUNT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_amount(m.as_str()))
}

/// A JSON-LD / API price field, which may be a number or a string.
pub(crate) fn json_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => first_amount(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_and_decimals() {
        assert_eq!(parse_amount("3,600"), Some(Decimal::from(3600)));
        assert_eq!(
            parse_amount("1,299.90"),
            Some(Decimal::from_str("1299.90").unwrap())
        );
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn first_amount_skips_leading_text() {
        assert_eq!(first_amount("מחיר: 2,499 ₪"), Some(Decimal::from(2499)));
        assert_eq!(first_amount("no digits"), None);
    }

    #[test]
    fn json_amount_accepts_numbers_and_strings() {
        assert_eq!(
            json_amount(&serde_json::json!(1499)),
            Some(Decimal::from(1499))
        );
        assert_eq!(
            json_amount(&serde_json::json!("1,499.00")),
            Some(Decimal::from(1499))
        );
        assert_eq!(json_amount(&serde_json::json!(null)), None);
    }
}
