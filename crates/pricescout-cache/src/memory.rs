//! In-memory LRU tier.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: i64,
}

/// Bounded map of serialized values with absolute expiry times.
///
/// Holds JSON text rather than typed values so both tiers share one
/// decoding path.
pub(crate) struct MemoryTier {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryTier {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live value for `key`; an expired entry is dropped on the way.
    pub(crate) fn get(&self, key: &str, now: i64) -> Option<String> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    pub(crate) fn put(&self, key: &str, value: String, expires_at: i64) {
        self.lock()
            .put(key.to_string(), MemoryEntry { value, expires_at });
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.lock().pop(key).is_some()
    }

    /// Removes every key starting with `prefix`, or everything when `None`.
    pub(crate) fn clear(&self, prefix: Option<&str>) -> usize {
        let mut entries = self.lock();
        match prefix {
            None => {
                let n = entries.len();
                entries.clear();
                n
            }
            Some(prefix) => {
                let doomed: Vec<String> = entries
                    .iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in &doomed {
                    entries.pop(key);
                }
                doomed.len()
            }
        }
    }

    pub(crate) fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let tier = MemoryTier::new(2);
        tier.put("a", "1".into(), 100);
        tier.put("b", "2".into(), 100);
        assert_eq!(tier.get("a", 0).as_deref(), Some("1"));
        tier.put("c", "3".into(), 100);

        assert!(tier.get("b", 0).is_none());
        assert_eq!(tier.get("a", 0).as_deref(), Some("1"));
        assert_eq!(tier.len(), 2);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let tier = MemoryTier::new(4);
        tier.put("k", "v".into(), 10);
        assert!(tier.get("k", 10).is_none());
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn clear_by_prefix_leaves_other_types() {
        let tier = MemoryTier::new(4);
        tier.put("scraper:a", "1".into(), 100);
        tier.put("scraper:b", "1".into(), 100);
        tier.put("contact:a", "1".into(), 100);
        assert_eq!(tier.clear(Some("scraper:")), 2);
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.purge_expired(100), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let tier = MemoryTier::new(0);
        tier.put("a", "1".into(), 100);
        tier.put("b", "2".into(), 100);
        assert_eq!(tier.len(), 1);
    }
}
