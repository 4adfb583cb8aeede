//! Persistent cache tier.

use async_trait::async_trait;
use pricescout_db::{CacheEntryRow, CacheTypeStatsRow, DbError, NewCacheEntry};
use sqlx::SqlitePool;

/// Key-value store behind the memory tier. Each write is a single upsert.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntryRow>, DbError>;
    async fn put(&self, entry: &NewCacheEntry<'_>) -> Result<(), DbError>;
    async fn record_hit(&self, key: &str) -> Result<(), DbError>;
    async fn delete(&self, key: &str) -> Result<bool, DbError>;
    async fn delete_expired(&self, now: i64) -> Result<u64, DbError>;
    async fn clear(&self, cache_type: Option<&str>) -> Result<u64, DbError>;
    async fn stats(&self, now: i64) -> Result<Vec<CacheTypeStatsRow>, DbError>;
}

/// [`CacheStore`] over the `cache_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntryRow>, DbError> {
        pricescout_db::get_cache_entry(&self.pool, key).await
    }

    async fn put(&self, entry: &NewCacheEntry<'_>) -> Result<(), DbError> {
        pricescout_db::upsert_cache_entry(&self.pool, entry).await
    }

    async fn record_hit(&self, key: &str) -> Result<(), DbError> {
        pricescout_db::record_cache_hit(&self.pool, key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, DbError> {
        pricescout_db::delete_cache_entry(&self.pool, key).await
    }

    async fn delete_expired(&self, now: i64) -> Result<u64, DbError> {
        pricescout_db::delete_expired_cache_entries(&self.pool, now).await
    }

    async fn clear(&self, cache_type: Option<&str>) -> Result<u64, DbError> {
        pricescout_db::clear_cache_entries(&self.pool, cache_type).await
    }

    async fn stats(&self, now: i64) -> Result<Vec<CacheTypeStatsRow>, DbError> {
        pricescout_db::cache_type_stats(&self.pool, now).await
    }
}
