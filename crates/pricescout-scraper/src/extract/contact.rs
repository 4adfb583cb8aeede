//! Seller contact (phone / WhatsApp) extraction.
//!
//! Sources are tried in priority order:
//!
//! 1. WhatsApp deep links anywhere in markup or script text.
//! 2. WhatsApp buttons carrying the number in `data-*` or `onclick`.
//! 3. The optional [`ButtonProbe`], for buttons that need a real click.
//! 4. Israeli phone patterns, first inside priority zones (JSON-LD business
//!    nodes, `tel:` links, footer/contact/about blocks), then the bottom
//!    half of the document, then the whole document.
//!
//! Every number is returned in `+<country-code><national-number>` form.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::jsonld::{business_telephones, jsonld_nodes};
use super::probe::ButtonProbe;

const IL_COUNTRY_CODE: &str = "972";

static WHATSAPP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:wa\.me/|(?:api|web)\.whatsapp\.com/send/?\?(?:[^"'\s<>]*?&(?:amp;)?)?phone=|whatsapp://send/?\?(?:[^"'\s<>]*?&(?:amp;)?)?phone=)(?:%2B|\+)?(\d{9,15})"#,
    )
    .expect("valid regex")
});

/// Mobile `05X`, landline `0X` / `07X`, and `+972` / `972` variants.
static IL_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\+972|\b972)[-\s.]?(?:5\d|[2-489]|7\d)[-\s.]?\d{3}[-\s.]?\d{4}\b|\b0(?:5\d|[2-489]|7\d)[-\s.]?\d{3}[-\s.]?\d{4}\b",
    )
    .expect("valid regex")
});

static WHATSAPP_BUTTON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*=whatsapp], [id*=whatsapp], [class*=WhatsApp], [data-whatsapp]")
        .expect("valid selector")
});

static ZONE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "footer, [class*=contact], [id*=contact], [class*=phone], [id*=phone], \
         [class*=whatsapp], [id*=whatsapp], [class*=about], [id*=about], \
         [itemtype*=LocalBusiness], [itemtype*=Organization]",
    )
    .expect("valid selector")
});

static TEL_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="tel:"]"#).expect("valid selector"));

const BUTTON_NUMBER_ATTRS: &[&str] = &[
    "data-phone",
    "data-number",
    "data-whatsapp",
    "data-wa",
    "data-tel",
    "onclick",
    "href",
];

/// Normalizes a phone number to `+<country-code><national-number>`.
///
/// Leading `0` becomes `+972`, bare `972…` becomes `+972…`, and `00` is
/// treated as the international prefix. Returns `None` when the digits
/// cannot form a plausible number.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+') || trimmed.starts_with("%2B");
    let digits: String = trimmed
        .trim_start_matches("%2B")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let international = if has_plus {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if digits.starts_with(IL_COUNTRY_CODE) {
        digits
    } else if let Some(national) = digits.strip_prefix('0') {
        format!("{IL_COUNTRY_CODE}{national}")
    } else {
        return None;
    };

    if let Some(national) = international.strip_prefix(IL_COUNTRY_CODE) {
        // 8-digit landlines, 9-digit mobiles and 07X numbers.
        let valid = matches!(national.len(), 8 | 9) && !national.starts_with('0');
        return valid.then(|| format!("+{international}"));
    }
    (10..=15)
        .contains(&international.len())
        .then(|| format!("+{international}"))
}

/// Whether a normalized number is an Israeli mobile (WhatsApp-capable).
#[must_use]
pub fn is_mobile(normalized: &str) -> bool {
    normalized.starts_with("+9725")
}

#[derive(Default, Clone)]
pub struct ContactExtractor {
    probe: Option<Arc<dyn ButtonProbe>>,
}

impl std::fmt::Debug for ContactExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactExtractor")
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

impl ContactExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_probe(probe: Arc<dyn ButtonProbe>) -> Self {
        Self { probe: Some(probe) }
    }

    /// Full extraction including the browser probe when one is configured.
    /// `url` is the page the markup came from; the probe revisits it.
    pub async fn extract(&self, html: &str, url: &str) -> Option<String> {
        if let Some(phone) = whatsapp_link_number(html).or_else(|| whatsapp_button_number(html)) {
            tracing::debug!(url, "contact found in whatsapp link or button");
            return Some(phone);
        }

        if let Some(probe) = &self.probe {
            if html.to_lowercase().contains("whatsapp") {
                match probe.capture_urls(url).await {
                    Ok(captured) => {
                        if let Some(phone) = whatsapp_link_number(&captured.join("\n")) {
                            tracing::debug!(url, "contact found by button probe");
                            return Some(phone);
                        }
                    }
                    Err(e) => tracing::warn!(url, error = %e, "button probe failed"),
                }
            }
        }

        let phone = phone_by_zones(html);
        if phone.is_some() {
            tracing::debug!(url, "contact found by phone pattern");
        }
        phone
    }

    /// Extraction from markup alone, without the browser probe.
    #[must_use]
    pub fn extract_static(&self, html: &str) -> Option<String> {
        whatsapp_link_number(html)
            .or_else(|| whatsapp_button_number(html))
            .or_else(|| phone_by_zones(html))
    }
}

/// First normalized number from a WhatsApp deep link in `text`.
pub(crate) fn whatsapp_link_number(text: &str) -> Option<String> {
    WHATSAPP_LINK_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .find_map(|m| {
            let digits = m.as_str();
            if digits.starts_with('0') {
                normalize_phone(digits)
            } else {
                normalize_phone(&format!("+{digits}"))
            }
        })
}

/// Buttons that keep the number in an attribute rather than a link.
fn whatsapp_button_number(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&WHATSAPP_BUTTON_SELECTOR).find_map(|el| {
        BUTTON_NUMBER_ATTRS
            .iter()
            .filter_map(|attr| el.value().attr(attr))
            .find_map(|value| {
                whatsapp_link_number(value)
                    .or_else(|| first_phone(value))
                    .or_else(|| normalize_phone(value))
            })
    })
}

/// First phone in `text`, preferring mobiles over landlines.
pub(crate) fn first_phone(text: &str) -> Option<String> {
    let found: Vec<String> = IL_PHONE_RE
        .find_iter(text)
        .filter_map(|m| normalize_phone(m.as_str()))
        .collect();
    found
        .iter()
        .find(|p| is_mobile(p))
        .or_else(|| found.first())
        .cloned()
}

fn phone_by_zones(html: &str) -> Option<String> {
    if let Some(phone) = jsonld_nodes(html)
        .iter()
        .flat_map(business_telephones)
        .find_map(|t| normalize_phone(&t))
    {
        return Some(phone);
    }

    let doc = Html::parse_document(html);
    for zone in doc.select(&ZONE_SELECTOR) {
        if let Some(phone) = zone_phone(zone) {
            return Some(phone);
        }
    }
    if let Some(phone) = doc
        .select(&TEL_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| normalize_phone(href.trim_start_matches("tel:")))
    {
        return Some(phone);
    }

    first_phone(bottom_half(html)).or_else(|| first_phone(html))
}

fn zone_phone(zone: ElementRef<'_>) -> Option<String> {
    zone.select(&TEL_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| normalize_phone(href.trim_start_matches("tel:")))
        .or_else(|| first_phone(&zone.text().collect::<Vec<_>>().join(" ")))
}

fn bottom_half(html: &str) -> &str {
    let mut mid = html.len() / 2;
    while !html.is_char_boundary(mid) {
        mid += 1;
    }
    &html[mid..]
}

#[cfg(test)]
#[path = "contact_test.rs"]
mod tests;
