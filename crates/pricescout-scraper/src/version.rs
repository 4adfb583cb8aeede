//! Version hashes of the code behind each cacheable operation.
//!
//! Each hash covers the source files whose logic shapes the cached value,
//! so editing any of them orphans entries produced by the old code.

use std::sync::LazyLock;

use pricescout_core::source_fingerprint;

const FETCH_SOURCES: &[&str] = &[
    include_str!("client/challenge.rs"),
    include_str!("origin.rs"),
];

const EXTRACTION_SOURCES: &[&str] = &[
    include_str!("extract/price.rs"),
    include_str!("extract/number.rs"),
    include_str!("extract/jsonld.rs"),
    include_str!("redirect.rs"),
];

const ADAPTER_SOURCES: &[&str] = &[
    include_str!("adapters/common.rs"),
    include_str!("adapters/relevance.rs"),
    include_str!("adapters/zap.rs"),
    include_str!("adapters/wisebuy.rs"),
    include_str!("adapters/ksp.rs"),
    include_str!("adapters/bug.rs"),
    include_str!("search.rs"),
    include_str!("seller.rs"),
];

const CONTACT_SOURCES: &[&str] = &[
    include_str!("extract/contact.rs"),
    include_str!("extract/probe.rs"),
    include_str!("extract/jsonld.rs"),
    include_str!("adapters/common.rs"),
];

static SEARCH_VERSION: LazyLock<String> = LazyLock::new(|| {
    let sources: Vec<&str> = FETCH_SOURCES
        .iter()
        .chain(EXTRACTION_SOURCES)
        .chain(ADAPTER_SOURCES)
        .copied()
        .collect();
    source_fingerprint(&sources)
});

static CONTACT_VERSION: LazyLock<String> = LazyLock::new(|| {
    let sources: Vec<&str> = FETCH_SOURCES.iter().chain(CONTACT_SOURCES).copied().collect();
    source_fingerprint(&sources)
});

/// Covers listing search: challenge detection, fetch-side extraction,
/// adapters, dedup. Seller aggregation is recomputed from cached searches
/// and has no entry of its own.
#[must_use]
pub fn search_version() -> &'static str {
    &SEARCH_VERSION
}

#[must_use]
pub fn contact_version() -> &'static str {
    &CONTACT_VERSION
}
