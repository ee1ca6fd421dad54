//! Fingerprint-keyed TTL caches for retrieval and ranking results.
//!
//! Expiry is passive: validity is checked at read time and an expired entry
//! is evicted by the lookup that finds it. There is no background sweep.
//! A TTL of zero disables the cache outright: lookups report absent and
//! writes are no-ops, so "caching off" is a configuration value, not a
//! separate code path at the call sites.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    created: Instant,
    payload: T,
}

/// Shared in-memory cache keyed by a 64-bit content fingerprint.
///
/// Reads and writes on one key are linearizable through the single mutex;
/// no ordering is guaranteed across distinct keys, and none is needed.
pub struct TtlCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<u64, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Creates a cache whose entries live for `ttl`. `Duration::ZERO`
    /// disables the cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` when the cache was configured with a zero TTL.
    pub fn disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    /// Returns the payload for `fingerprint` if present and unexpired.
    /// An expired entry is evicted on the spot.
    pub fn get(&self, fingerprint: u64) -> Option<T> {
        if self.ttl.is_zero() {
            return None;
        }

        let mut entries = self.entries.lock();
        match entries.get(&fingerprint) {
            Some(entry) if entry.created.elapsed() < self.ttl => {
                return Some(entry.payload.clone());
            }
            Some(_) => {}
            None => return None,
        }

        entries.remove(&fingerprint);
        None
    }

    /// Stores `payload` under `fingerprint`, overwriting any prior entry.
    pub fn insert(&self, fingerprint: u64, payload: T) {
        if self.ttl.is_zero() {
            return;
        }

        self.entries.lock().insert(
            fingerprint,
            CacheEntry {
                created: Instant::now(),
                payload,
            },
        );
    }

    /// Number of stored entries (expired ones included until a lookup
    /// evicts them).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<T> std::fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "payload".to_string());
        assert_eq!(cache.get(1), Some("payload".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(42), None);
    }

    #[test]
    fn expired_entry_reports_absent_and_is_evicted() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert(1, "payload".to_string());
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get(1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_disables_reads_and_writes() {
        let cache = TtlCache::new(Duration::ZERO);
        assert!(cache.disabled());

        cache.insert(1, "payload".to_string());
        assert_eq!(cache.get(1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_overwrites_by_key() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "old".to_string());
        cache.insert(1, "new".to_string());
        assert_eq!(cache.get(1), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, 1u32);
        cache.insert(2, 2u32);
        cache.clear();
        assert!(cache.is_empty());
    }
}
