//! Canonical seller identity.
//!
//! The same business shows up as `אבי סופר`, `Sofer Avi` and `SOFERAVI`
//! depending on the source. [`SellerNormalizer::normalize`] maps all of
//! them to one key, and is idempotent: normalizing a key returns the key.

use std::collections::BTreeMap;

use pricescout_core::{DomainSet, SourcesConfig};

use crate::origin::{domain_label, host_of};

/// Words that never distinguish one seller from another.
const SUFFIX_TOKENS: &[&str] = &[
    "ltd", "inc", "llc", "co", "il", "com", "www", "store", "shop", "online", "בעמ", "חנות",
    "אונליין",
];

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '׳', '״'];

/// Lowercase, keep only letters and digits of any script.
///
/// Lowercasing comes first: it can emit combining marks (`İ` becomes
/// `i\u{307}`), which the filter then drops.
#[must_use]
pub fn generic_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn tokens(name: &str) -> Vec<String> {
    let lowered: String = name
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct Alias {
    canonical: String,
    /// Compacted spellings, including the canonical key itself.
    forms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SellerNormalizer {
    aliases: Vec<Alias>,
    aggregators: DomainSet,
}

impl SellerNormalizer {
    #[must_use]
    pub fn new(aliases: &BTreeMap<String, Vec<String>>, aggregators: DomainSet) -> Self {
        let aliases = aliases
            .iter()
            .map(|(canonical, names)| {
                let mut forms: Vec<String> = std::iter::once(canonical.as_str())
                    .chain(names.iter().map(String::as_str))
                    .map(generic_key)
                    .filter(|f| !f.is_empty())
                    .collect();
                forms.dedup();
                Alias {
                    canonical: canonical.clone(),
                    forms,
                }
            })
            .collect();
        Self {
            aliases,
            aggregators,
        }
    }

    #[must_use]
    pub fn from_sources(sources: &SourcesConfig) -> Self {
        Self::new(&sources.seller_aliases, sources.aggregator_domains.clone())
    }

    /// Matches whole names only: the name's words, with generic business
    /// suffixes dropped, must spell an alias exactly. `BUG Electric` does
    /// not match the `bug` alias.
    fn alias_for(&self, name: &str) -> Option<&str> {
        let words = tokens(name);
        let full: String = words.concat();
        let significant: String = words
            .iter()
            .filter(|w| !SUFFIX_TOKENS.contains(&w.as_str()))
            .map(String::as_str)
            .collect();

        self.aliases
            .iter()
            .find(|alias| {
                alias
                    .forms
                    .iter()
                    .any(|form| *form == full || (!significant.is_empty() && *form == significant))
            })
            .map(|alias| alias.canonical.as_str())
    }

    /// Canonical key for a seller name, optionally informed by the seller's
    /// URL.
    ///
    /// Order: alias table, then the URL's domain label (unless the URL is on
    /// an aggregator), then [`generic_key`].
    #[must_use]
    pub fn normalize(&self, name: &str, url: Option<&str>) -> String {
        if let Some(canonical) = self.alias_for(name) {
            return canonical.to_string();
        }

        if let Some(label) = url
            .and_then(host_of)
            .filter(|host| !self.aggregators.contains_host(host))
            .and_then(|host| domain_label(&host))
        {
            if let Some(canonical) = self.alias_for(&label) {
                return canonical.to_string();
            }
            let key = generic_key(&label);
            if !key.is_empty() {
                return key;
            }
        }

        generic_key(name)
    }
}

impl Default for SellerNormalizer {
    fn default() -> Self {
        Self::from_sources(&SourcesConfig::default())
    }
}

#[cfg(test)]
#[path = "seller_test.rs"]
mod tests;
