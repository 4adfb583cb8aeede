//! Cache key construction.
//!
//! Keys read `{cache_type}:{component}:{version_hash}:{args_hash}`. The
//! version hash fingerprints the code that produced a value, so changing
//! that code makes every old key unreachable without deleting anything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CacheError;

const ARGS_HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Results scraped from sources.
    Scraper,
    /// Seller contact details.
    Contact,
    /// Short-lived results of the conversational layer.
    Agent,
}

impl CacheType {
    pub const ALL: [CacheType; 3] = [Self::Scraper, Self::Contact, Self::Agent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scraper => "scraper",
            Self::Contact => "contact",
            Self::Agent => "agent",
        }
    }

    /// Prefix shared by every key of this type.
    #[must_use]
    pub fn key_prefix(self) -> String {
        format!("{}:", self.as_str())
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CacheError::UnknownCacheType(s.to_string()))
    }
}

/// Builds the cache key for one call of `component` with `args`.
///
/// `args` is hashed through its JSON encoding, so any two argument values
/// that serialize identically share a key.
///
/// # Errors
///
/// Returns [`CacheError::Serialize`] if `args` cannot be encoded as JSON.
pub fn make_cache_key<A: Serialize + ?Sized>(
    cache_type: CacheType,
    component: &str,
    version_hash: &str,
    args: &A,
) -> Result<String, CacheError> {
    let encoded = serde_json::to_vec(args).map_err(CacheError::Serialize)?;
    let digest = format!("{:x}", Sha256::digest(&encoded));
    Ok(format!(
        "{cache_type}:{component}:{version_hash}:{}",
        &digest[..ARGS_HASH_LEN]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_has_four_segments() {
        let key = make_cache_key(CacheType::Scraper, "search", "v1", &("tv", "IL", 5)).unwrap();
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "scraper");
        assert_eq!(parts[1], "search");
        assert_eq!(parts[2], "v1");
        assert_eq!(parts[3].len(), ARGS_HASH_LEN);
    }

    #[test]
    fn identical_arguments_produce_identical_keys() {
        let a = make_cache_key(CacheType::Contact, "contact", "v1", &"https://a.example").unwrap();
        let b = make_cache_key(CacheType::Contact, "contact", "v1", &"https://a.example").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn version_change_produces_a_new_key() {
        let old = make_cache_key(CacheType::Scraper, "search", "aaaa", &("tv", 5)).unwrap();
        let new = make_cache_key(CacheType::Scraper, "search", "bbbb", &("tv", 5)).unwrap();
        assert_ne!(old, new);
    }

    #[test]
    fn different_arguments_produce_different_keys() {
        let tv = make_cache_key(CacheType::Scraper, "search", "v1", &("tv", 5)).unwrap();
        let fridge = make_cache_key(CacheType::Scraper, "search", "v1", &("fridge", 5)).unwrap();
        assert_ne!(tv, fridge);
    }

    #[test]
    fn cache_type_parses_case_insensitively() {
        assert_eq!("Contact".parse::<CacheType>().unwrap(), CacheType::Contact);
        assert!(matches!(
            "session".parse::<CacheType>(),
            Err(CacheError::UnknownCacheType(_))
        ));
    }
}
