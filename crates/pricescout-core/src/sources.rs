//! Per-source operational configuration: rate limits, SSL bypass list,
//! aggregator/social domain sets, header overrides and seller aliases.
//!
//! Built-in defaults cover the sources shipped with the scraper. A YAML file
//! can extend or override any section; sections absent from the file keep
//! their defaults.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Token-bucket parameters for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSpec {
    /// Tokens refilled per second.
    pub rate: f64,
    /// Maximum burst size.
    pub capacity: f64,
}

impl Default for RateLimitSpec {
    fn default() -> Self {
        Self {
            rate: 1.0,
            capacity: 3.0,
        }
    }
}

/// A set of registrable domains matched against hosts by suffix.
///
/// `zap.co.il` matches `zap.co.il`, `www.zap.co.il` and `m.zap.co.il`, but
/// not `notzap.co.il`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSet(Vec<String>);

impl DomainSet {
    #[must_use]
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for d in domains {
            let d = d.into().trim().trim_start_matches('.').to_ascii_lowercase();
            if !d.is_empty() && seen.insert(d.clone()) {
                out.push(d);
            }
        }
        Self(out)
    }

    /// Returns the configured domain that `host` belongs to, if any.
    #[must_use]
    pub fn matching<'a>(&'a self, host: &str) -> Option<&'a str> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.0
            .iter()
            .find(|d| host == **d || host.ends_with(&format!(".{d}")))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains_host(&self, host: &str) -> bool {
        self.matching(host).is_some()
    }

    pub fn extend<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let merged: Vec<String> = self
            .0
            .drain(..)
            .chain(domains.into_iter().map(Into::into))
            .collect();
        *self = Self::new(merged);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub default_rate_limit: RateLimitSpec,
    pub rate_limits: BTreeMap<String, RateLimitSpec>,
    /// Domains with broken certificate chains; TLS verification is skipped
    /// for these hosts only.
    pub ssl_bypass_domains: DomainSet,
    /// Price-comparison portals whose outbound links must be resolved to
    /// find the real seller.
    pub aggregator_domains: DomainSet,
    /// Never treated as a seller site during redirect resolution.
    pub social_domains: DomainSet,
    pub header_overrides: BTreeMap<String, BTreeMap<String, String>>,
    /// Canonical seller key -> known spellings (Hebrew and English).
    pub seller_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let mut rate_limits = BTreeMap::new();
        rate_limits.insert(
            "zap.co.il".to_string(),
            RateLimitSpec {
                rate: 0.5,
                capacity: 2.0,
            },
        );
        rate_limits.insert(
            "wisebuy.co.il".to_string(),
            RateLimitSpec {
                rate: 0.5,
                capacity: 2.0,
            },
        );
        rate_limits.insert(
            "ksp.co.il".to_string(),
            RateLimitSpec {
                rate: 2.0,
                capacity: 5.0,
            },
        );

        let mut header_overrides = BTreeMap::new();
        let mut zap_headers = BTreeMap::new();
        zap_headers.insert("Referer".to_string(), "https://www.zap.co.il/".to_string());
        zap_headers.insert(
            "Accept-Language".to_string(),
            "he-IL,he;q=0.9,en;q=0.8".to_string(),
        );
        header_overrides.insert("zap.co.il".to_string(), zap_headers);

        let aliases: &[(&str, &[&str])] = &[
            (
                "soferavi",
                &["soferavi", "sofer avi", "אבי סופר", "סופר אבי", "סופראבי"],
            ),
            ("ksp", &["ksp", "k.s.p", "קיי אס פי"]),
            ("bug", &["bug", "באג", "bug.co.il"]),
            ("ivory", &["ivory", "אייבורי", "איבורי"]),
            (
                "machsaneihashmal",
                &["machsanei hashmal", "מחסני חשמל", "מחסני החשמל"],
            ),
            ("lastprice", &["last price", "lastprice", "לאסט פרייס"]),
            ("payngo", &["payngo", "pay n go", "פיינגו", "מחסני פיינגו"]),
        ];
        let seller_aliases = aliases
            .iter()
            .map(|(key, names)| {
                (
                    (*key).to_string(),
                    names.iter().map(|n| (*n).to_string()).collect(),
                )
            })
            .collect();

        Self {
            default_rate_limit: RateLimitSpec::default(),
            rate_limits,
            ssl_bypass_domains: DomainSet::new(["wisebuy.co.il"]),
            aggregator_domains: DomainSet::new([
                "zap.co.il",
                "wisebuy.co.il",
                "pricez.co.il",
                "google.com",
                "googleadservices.com",
            ]),
            social_domains: DomainSet::new([
                "facebook.com",
                "instagram.com",
                "twitter.com",
                "x.com",
                "youtube.com",
                "tiktok.com",
                "linkedin.com",
                "pinterest.com",
                "whatsapp.com",
                "wa.me",
            ]),
            header_overrides,
            seller_aliases,
        }
    }
}

/// Partial YAML document; every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SourcesFile {
    default_rate_limit: Option<RateLimitSpec>,
    rate_limits: BTreeMap<String, RateLimitSpec>,
    ssl_bypass_domains: Vec<String>,
    aggregator_domains: Vec<String>,
    social_domains: Vec<String>,
    header_overrides: BTreeMap<String, BTreeMap<String, String>>,
    seller_aliases: BTreeMap<String, Vec<String>>,
}

impl SourcesConfig {
    /// Rate-limit parameters for `host`, falling back to the default.
    #[must_use]
    pub fn rate_limit_for(&self, host: &str) -> RateLimitSpec {
        let host = host.to_ascii_lowercase();
        self.rate_limits
            .iter()
            .find(|(domain, _)| host == **domain || host.ends_with(&format!(".{domain}")))
            .map_or(self.default_rate_limit, |(_, spec)| *spec)
    }

    /// Parses a YAML document and merges it over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourcesFileParse`] on malformed YAML and
    /// [`ConfigError::Validation`] when merged values are out of range.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: SourcesFile = serde_yaml::from_str(content)?;
        let mut config = Self::default();

        if let Some(default) = file.default_rate_limit {
            config.default_rate_limit = default;
        }
        for (domain, spec) in file.rate_limits {
            config.rate_limits.insert(domain.to_ascii_lowercase(), spec);
        }
        config.ssl_bypass_domains.extend(file.ssl_bypass_domains);
        config.aggregator_domains.extend(file.aggregator_domains);
        config.social_domains.extend(file.social_domains);
        for (domain, headers) in file.header_overrides {
            config
                .header_overrides
                .entry(domain.to_ascii_lowercase())
                .or_default()
                .extend(headers);
        }
        for (canonical, names) in file.seller_aliases {
            config
                .seller_aliases
                .entry(canonical)
                .or_default()
                .extend(names);
        }

        validate_sources(&config)?;
        Ok(config)
    }
}

/// Load the sources configuration from a YAML file.
///
/// A missing file is not an error: the built-in defaults are returned.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesConfig, ConfigError> {
    if !path.exists() {
        return Ok(SourcesConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    SourcesConfig::from_yaml(&content)
}

fn validate_sources(config: &SourcesConfig) -> Result<(), ConfigError> {
    let check = |label: &str, spec: &RateLimitSpec| -> Result<(), ConfigError> {
        if !(spec.rate.is_finite() && spec.rate > 0.0) {
            return Err(ConfigError::Validation(format!(
                "rate limit for '{label}' must have rate > 0, got {}",
                spec.rate
            )));
        }
        if !(spec.capacity.is_finite() && spec.capacity >= 1.0) {
            return Err(ConfigError::Validation(format!(
                "rate limit for '{label}' must have capacity >= 1, got {}",
                spec.capacity
            )));
        }
        Ok(())
    };

    check("default", &config.default_rate_limit)?;
    for (domain, spec) in &config.rate_limits {
        check(domain, spec)?;
    }

    for canonical in config.seller_aliases.keys() {
        let valid = !canonical.is_empty()
            && canonical
                .chars()
                .all(|c| c.is_alphanumeric() && !c.is_uppercase());
        if !valid {
            return Err(ConfigError::Validation(format!(
                "seller alias key '{canonical}' must be non-empty lowercase alphanumeric"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
