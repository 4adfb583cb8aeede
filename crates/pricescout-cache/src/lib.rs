//! Two-tier result cache: a bounded in-memory LRU in front of a SQLite
//! table, with version-hashed keys and per-type TTLs.

pub mod cached;
pub mod key;
mod memory;
pub mod policy;
pub mod store;
pub mod two_tier;

pub use cached::Cached;
pub use key::{make_cache_key, CacheType};
pub use policy::CachePolicy;
pub use store::{CacheStore, SqliteStore};
pub use two_tier::{CacheStats, CacheTypeStats, TwoTierCache};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize cache value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("unknown cache type: {0}")]
    UnknownCacheType(String),

    #[error(transparent)]
    Store(#[from] pricescout_db::DbError),
}
