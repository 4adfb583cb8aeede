//! Memory-then-store cache.
//!
//! Reads check the LRU tier, then the persistent store. A store hit only
//! bumps that row's hit counter; it is not copied into memory. Writes go to
//! both tiers. Store failures and undecodable values are logged and
//! reported as misses, never as errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pricescout_db::NewCacheEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::key::CacheType;
use crate::memory::MemoryTier;
use crate::store::CacheStore;
use crate::CacheError;

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub store_hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Entries that existed but could not be decoded.
    pub corrupt: u64,
    pub memory_items: usize,
}

impl CacheStats {
    /// Share of lookups served from either tier, `0.0` before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.store_hits;
        let total = hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = hits as f64 / total as f64;
        rate
    }
}

/// Store-side summary for one cache type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTypeStats {
    pub cache_type: String,
    pub entries: i64,
    pub expired: i64,
    pub total_hits: i64,
}

#[derive(Debug, Default)]
struct Counters {
    memory_hits: AtomicU64,
    store_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    corrupt: AtomicU64,
}

pub struct TwoTierCache {
    memory: MemoryTier,
    store: Arc<dyn CacheStore>,
    counters: Counters,
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

impl TwoTierCache {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, memory_items: usize) -> Self {
        Self {
            memory: MemoryTier::new(memory_items),
            store,
            counters: Counters::default(),
        }
    }

    /// Cached value for `key`, or `None` on a miss, an expired entry, an
    /// undecodable entry, or a store failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = now_secs();

        if let Some(raw) = self.memory.get(key, now) {
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key, tier = "memory", "cache hit");
                    return Some(value);
                }
                Err(e) => {
                    self.counters.corrupt.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key, tier = "memory", error = %e, "undecodable cache entry, dropping");
                    self.memory.remove(key);
                }
            }
        }

        match self.store.get(key).await {
            Ok(Some(row)) if row.expires_at > now => match serde_json::from_str::<T>(&row.value) {
                Ok(value) => {
                    if let Err(e) = self.store.record_hit(key).await {
                        tracing::warn!(key, error = %e, "failed to record cache hit");
                    }
                    self.counters.store_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key, tier = "store", "cache hit");
                    return Some(value);
                }
                Err(e) => {
                    self.counters.corrupt.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key, tier = "store", error = %e, "undecodable cache entry, dropping");
                    self.delete_from_store(key).await;
                }
            },
            Ok(Some(_)) => {
                tracing::debug!(key, "expired cache entry evicted on read");
                self.delete_from_store(key).await;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "cache store read failed"),
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Writes `value` to both tiers with a lifetime of `ttl_secs`.
    ///
    /// A `ttl_secs` of zero or less stores an entry that is already expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialize`] if `value` cannot be encoded.
    /// Store failures are logged, not returned.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: i64,
        cache_type: CacheType,
        version_hash: &str,
    ) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value).map_err(CacheError::Serialize)?;
        let now = now_secs();
        let expires_at = now.saturating_add(ttl_secs);

        self.memory.put(key, encoded.clone(), expires_at);
        let entry = NewCacheEntry {
            key,
            value: &encoded,
            cache_type: cache_type.as_str(),
            version_hash,
            created_at: now,
            expires_at,
        };
        if let Err(e) = self.store.put(&entry).await {
            tracing::warn!(key, error = %e, "cache store write failed");
        }
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Removes `key` from both tiers. Returns whether either tier held it.
    pub async fn invalidate(&self, key: &str) -> bool {
        let in_memory = self.memory.remove(key);
        let in_store = match self.store.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache store delete failed");
                false
            }
        };
        in_memory || in_store
    }

    /// Removes every entry, or only entries of `cache_type`. Returns the
    /// number of store rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the store cannot be cleared.
    pub async fn clear(&self, cache_type: Option<CacheType>) -> Result<u64, CacheError> {
        let prefix = cache_type.map(CacheType::key_prefix);
        self.memory.clear(prefix.as_deref());
        let removed = self.store.clear(cache_type.map(CacheType::as_str)).await?;
        tracing::info!(cache_type = ?cache_type, removed, "cache cleared");
        Ok(removed)
    }

    /// Drops expired entries from both tiers. Returns the number of store
    /// rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the store sweep fails.
    pub async fn cleanup_expired(&self) -> Result<u64, CacheError> {
        let now = now_secs();
        let from_memory = self.memory.purge_expired(now);
        let from_store = self.store.delete_expired(now).await?;
        tracing::info!(from_memory, from_store, "expired cache entries removed");
        Ok(from_store)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            store_hits: self.counters.store_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            corrupt: self.counters.corrupt.load(Ordering::Relaxed),
            memory_items: self.memory.len(),
        }
    }

    /// Per-type row counts from the persistent store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the store query fails.
    pub async fn store_stats(&self) -> Result<Vec<CacheTypeStats>, CacheError> {
        let rows = self.store.stats(now_secs()).await?;
        Ok(rows
            .into_iter()
            .map(|r| CacheTypeStats {
                cache_type: r.cache_type,
                entries: r.entries,
                expired: r.expired,
                total_hits: r.total_hits,
            })
            .collect())
    }

    /// Runs [`Self::cleanup_expired`] every `interval` until the handle is
    /// aborted. The first sweep happens after one full interval.
    pub fn spawn_cleanup(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.cleanup_expired().await {
                    tracing::warn!(error = %e, "periodic cache cleanup failed");
                }
            }
        })
    }

    async fn delete_from_store(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "cache store delete failed");
        }
    }
}

#[cfg(test)]
#[path = "two_tier_test.rs"]
mod tests;
