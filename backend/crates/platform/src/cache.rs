//! Bounded LRU cache with per-entry expiry.
//!
//! Read-through caching for derived views (job matches, job statistics).
//! Entries expire after a fixed TTL and callers invalidate explicitly on write.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

const DEFAULT_CAPACITY: usize = 10_000;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Hit rate as a percentage.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    stats: CacheStats,
}

/// Cloneable handle; clones share the same storage.
pub struct TtlCache<K: Hash + Eq, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
        }
    }
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, ttl)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(cap),
                stats: CacheStats::default(),
            })),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, dropping it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let hit = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.pop(key);
                None
            }
            None => None,
        };

        if hit.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        let ttl = self.ttl;
        self.insert_with_ttl(key, value, ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut inner = self.inner.lock();
        inner.entries.put(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        inner.stats.insertions += 1;
    }

    pub fn invalidate(&self, key: &K) {
        let mut inner = self.inner.lock();
        if inner.entries.pop(key).is_some() {
            inner.stats.invalidations += 1;
        }
    }

    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        let n = inner.entries.len() as u64;
        inner.entries.clear();
        inner.stats.invalidations += n;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_after_insert() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"a"), None);
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert_with_ttl("a", 1, Duration::ZERO);
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "x");
        cache.insert(2, "y");
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("y"));

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let cache = TtlCache::with_capacity(2, Duration::from_secs(60));
        cache.insert(1, 1);
        cache.insert(2, 2);
        let _ = cache.get(&1);
        cache.insert(3, 3);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
    }

    #[test]
    fn test_clones_share_storage() {
        let a = TtlCache::new(Duration::from_secs(60));
        let b = a.clone();
        a.insert("k", 7);
        assert_eq!(b.get(&"k"), Some(7));
    }
}
