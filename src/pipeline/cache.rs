//! Time-bounded result cache
//!
//! Small TTL cache used to absorb bursts of fetch requests without hammering
//! the upstream site. Time is read through an injectable clock so expiry is
//! testable without sleeping.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Clock function the cache reads time from.
pub type CacheClock = Box<dyn Fn() -> Instant + Send + Sync>;

/// TTL cache holding one value per key.
///
/// A zero TTL disables the cache entirely: `get` always misses and `put` is
/// a no-op. Expired entries are swept lazily on access.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<Vec<(K, V, Instant)>>,
    clock: CacheClock,
}

impl<K: PartialEq, V: Clone> TtlCache<K, V> {
    /// Cache with the given time-to-live, reading the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(Instant::now))
    }

    /// Cache reading time from the supplied clock.
    pub fn with_clock(ttl: Duration, clock: CacheClock) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Value stored under `key`, unless missing or older than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let now = (self.clock)();
        let mut entries = self.entries.lock();
        entries.retain(|(_, _, stored_at)| now.duration_since(*stored_at) < self.ttl);
        entries
            .iter()
            .find(|(stored_key, _, _)| stored_key == key)
            .map(|(_, value, _)| value.clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let now = (self.clock)();
        let mut entries = self.entries.lock();
        entries.retain(|(stored_key, _, _)| stored_key != &key);
        entries.push((key, value, now));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as SyncMutex;
    use std::sync::Arc;

    /// Manually advanced clock: base instant plus a shared offset.
    fn manual_clock() -> (CacheClock, Arc<SyncMutex<Duration>>) {
        let offset = Arc::new(SyncMutex::new(Duration::ZERO));
        let base = Instant::now();
        let handle = offset.clone();
        let clock: CacheClock = Box::new(move || base + *handle.lock());
        (clock, offset)
    }

    #[test]
    fn test_hit_within_ttl() {
        let (clock, offset) = manual_clock();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock);
        cache.put("k", 1);

        *offset.lock() = Duration::from_secs(59);
        assert_eq!(cache.get(&"k"), Some(1));
    }

    #[test]
    fn test_miss_after_ttl_elapses() {
        let (clock, offset) = manual_clock();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock);
        cache.put("k", 1);

        *offset.lock() = Duration::from_secs(60);
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn test_put_refreshes_the_entry() {
        let (clock, offset) = manual_clock();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock);
        cache.put("k", 1);

        *offset.lock() = Duration::from_secs(45);
        cache.put("k", 2);

        *offset.lock() = Duration::from_secs(100);
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let cache = TtlCache::new(Duration::ZERO);
        assert!(!cache.is_enabled());
        cache.put("k", 1);
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let (clock, _offset) = manual_clock();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), None);
    }
}
