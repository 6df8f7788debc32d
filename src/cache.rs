//! Timestamped storage for fetched values.
//!
//! The store keeps one type-erased value per key along with the instant it
//! was written. Freshness and expiry are computed lazily against that
//! timestamp; nothing in here spawns tasks or wakes up on its own.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A successfully fetched value, erased to its trait object.
///
/// Values are stored behind `Arc` so snapshots and subscribers share one
/// allocation. Typed access goes through `Arc::downcast`, usually via
/// [`QueryHandle`](crate::query::QueryHandle).
pub type QueryData = Arc<dyn Any + Send + Sync>;

/// A cached value plus the instant it was written.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    pub(crate) value: QueryData,
    pub(crate) stored_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(value: QueryData) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    /// Whether the value is still considered fresh.
    ///
    /// A `stale_time` of zero means values are stale the moment they land.
    pub(crate) fn is_fresh(&self, stale_time: Duration) -> bool {
        self.stored_at.elapsed() < stale_time
    }

    /// Whether the value has outlived its retention window.
    ///
    /// `None` means the value never expires.
    pub(crate) fn is_expired(&self, cache_time: Option<Duration>) -> bool {
        match cache_time {
            Some(cache_time) => self.stored_at.elapsed() >= cache_time,
            None => false,
        }
    }
}

/// Concurrent map from key to [`CacheEntry`].
#[derive(Default)]
pub(crate) struct CacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl CacheStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Stores `value` under `key`, resetting its timestamp.
    pub(crate) fn insert(&self, key: &str, value: QueryData) {
        self.entries.insert(key.to_owned(), CacheEntry::new(value));
    }

    /// Returns the cached value, dropping it first if it has expired.
    pub(crate) fn get(&self, key: &str, cache_time: Option<Duration>) -> Option<QueryData> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.is_expired(cache_time) {
                    true
                } else {
                    return Some(Arc::clone(&entry.value));
                }
            }
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Whether a refetch is warranted for `key` under `stale_time`.
    ///
    /// Missing entries count as stale.
    pub(crate) fn is_stale(&self, key: &str, stale_time: Duration) -> bool {
        match self.entries.get(key) {
            Some(entry) => !entry.is_fresh(stale_time),
            None => true,
        }
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erased(n: u32) -> QueryData {
        Arc::new(n)
    }

    #[test]
    fn test_entry_is_immediately_stale_with_zero_stale_time() {
        let entry = CacheEntry::new(erased(1));
        assert!(!entry.is_fresh(Duration::ZERO));
    }

    #[test]
    fn test_entry_stays_fresh_within_stale_time() {
        let entry = CacheEntry::new(erased(1));
        assert!(entry.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_entry_goes_stale_after_stale_time() {
        let entry = CacheEntry::new(erased(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!entry.is_fresh(Duration::from_millis(5)));
    }

    #[test]
    fn test_entry_never_expires_without_cache_time() {
        let entry = CacheEntry::new(erased(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(!entry.is_expired(None));
    }

    #[test]
    fn test_entry_expires_after_cache_time() {
        let entry = CacheEntry::new(erased(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(entry.is_expired(Some(Duration::from_millis(5))));
        assert!(!entry.is_expired(Some(Duration::from_secs(60))));
    }

    #[test]
    fn test_store_round_trips_values() {
        let store = CacheStore::new();
        store.insert("todos", erased(7));

        let value = store.get("todos", None).and_then(|v| v.downcast::<u32>().ok());
        assert_eq!(value.as_deref(), Some(&7));
    }

    #[test]
    fn test_store_get_drops_expired_entries() {
        let store = CacheStore::new();
        store.insert("todos", erased(7));
        std::thread::sleep(Duration::from_millis(20));

        assert!(store.get("todos", Some(Duration::from_millis(5))).is_none());
        // lazy removal happened, so even an unlimited lookup misses now
        assert!(store.get("todos", None).is_none());
    }

    #[test]
    fn test_store_missing_key_is_stale() {
        let store = CacheStore::new();
        assert!(store.is_stale("todos", Duration::from_secs(60)));
    }

    #[test]
    fn test_store_staleness_tracks_stale_time() {
        let store = CacheStore::new();
        store.insert("todos", erased(7));

        assert!(store.is_stale("todos", Duration::ZERO));
        assert!(!store.is_stale("todos", Duration::from_secs(60)));
    }

    #[test]
    fn test_store_remove_and_clear() {
        let store = CacheStore::new();
        store.insert("a", erased(1));
        store.insert("b", erased(2));

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.get("a", None).is_none());

        store.clear();
        assert!(store.get("b", None).is_none());
    }
}
