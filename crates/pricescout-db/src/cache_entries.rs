//! Database operations for `cache_entries`, the persistent cache tier.
//!
//! Expiry is never checked here beyond what each query states; the cache
//! crate owns the decision of what counts as live.

use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `cache_entries` table. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CacheEntryRow {
    pub key: String,
    pub value: String,
    pub cache_type: String,
    pub version_hash: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub hit_count: i64,
}

/// Values for inserting or replacing a cache entry.
#[derive(Debug, Clone, Copy)]
pub struct NewCacheEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub cache_type: &'a str,
    pub version_hash: &'a str,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Per-`cache_type` summary of the table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CacheTypeStatsRow {
    pub cache_type: String,
    pub entries: i64,
    pub expired: i64,
    pub total_hits: i64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Inserts `entry`, replacing any row with the same key. A replaced row
/// starts over with `hit_count = 0`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_cache_entry(pool: &SqlitePool, entry: &NewCacheEntry<'_>) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO cache_entries \
             (key, value, cache_type, version_hash, created_at, expires_at, hit_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0) \
         ON CONFLICT (key) DO UPDATE SET \
             value = excluded.value, \
             cache_type = excluded.cache_type, \
             version_hash = excluded.version_hash, \
             created_at = excluded.created_at, \
             expires_at = excluded.expires_at, \
             hit_count = 0",
    )
    .bind(entry.key)
    .bind(entry.value)
    .bind(entry.cache_type)
    .bind(entry.version_hash)
    .bind(entry.created_at)
    .bind(entry.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the row for `key`, expired or not.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_cache_entry(pool: &SqlitePool, key: &str) -> Result<Option<CacheEntryRow>, DbError> {
    let row = sqlx::query_as::<_, CacheEntryRow>(
        "SELECT key, value, cache_type, version_hash, created_at, expires_at, hit_count \
         FROM cache_entries WHERE key = ?1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Increments `hit_count` for `key`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that key, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn record_cache_hit(pool: &SqlitePool, key: &str) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE cache_entries SET hit_count = hit_count + 1 WHERE key = ?1")
        .bind(key)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Deletes the row for `key`. Returns whether a row existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_cache_entry(pool: &SqlitePool, key: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every row with `expires_at <= now`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_expired_cache_entries(pool: &SqlitePool, now: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes every row, or only rows of `cache_type` when given.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_cache_entries(
    pool: &SqlitePool,
    cache_type: Option<&str>,
) -> Result<u64, DbError> {
    let result = match cache_type {
        Some(cache_type) => {
            sqlx::query("DELETE FROM cache_entries WHERE cache_type = ?1")
                .bind(cache_type)
                .execute(pool)
                .await?
        }
        None => sqlx::query("DELETE FROM cache_entries").execute(pool).await?,
    };
    Ok(result.rows_affected())
}

/// Row counts, expired counts and total hits grouped by `cache_type`,
/// ordered by type name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn cache_type_stats(
    pool: &SqlitePool,
    now: i64,
) -> Result<Vec<CacheTypeStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, CacheTypeStatsRow>(
        "SELECT cache_type, \
                COUNT(*) AS entries, \
                COALESCE(SUM(CASE WHEN expires_at <= ?1 THEN 1 ELSE 0 END), 0) AS expired, \
                COALESCE(SUM(hit_count), 0) AS total_hits \
         FROM cache_entries \
         GROUP BY cache_type \
         ORDER BY cache_type",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
