//! Source fingerprints used as cache version hashes.

use sha2::{Digest, Sha256};

/// Length of the hex prefix kept from the SHA-256 digest.
const FINGERPRINT_LEN: usize = 16;

/// Hashes the given source texts into a short, stable hex fingerprint.
///
/// Callers pass the exact source of the logic that produces a cached value
/// (typically via `include_str!`), so editing that logic yields a new
/// fingerprint and orphans every cache entry computed by the old code.
#[must_use]
pub fn source_fingerprint(sources: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for source in sources {
        hasher.update((source.len() as u64).to_le_bytes());
        hasher.update(source.as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
