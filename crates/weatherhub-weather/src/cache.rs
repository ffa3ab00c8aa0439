//! In-memory time-to-live cache for normalized weather records.
//!
//! Expiry is lazy: an entry older than the TTL is dropped by the `get` that
//! finds it, there is no background sweep.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key/value store whose entries are visible only while younger than `ttl`.
pub struct ExpiringCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, evicting it first if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => now.saturating_duration_since(entry.inserted_at) >= self.ttl,
        };

        if expired {
            entries.remove(key);
            tracing::debug!(?key, "Cache entry expired");
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` stamped with the current time, replacing any previous entry.
    pub fn set(&self, key: K, value: V) {
        let inserted_at = self.clock.now();
        self.entries
            .lock()
            .insert(key, CacheEntry { value, inserted_at });
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> fmt::Debug for ExpiringCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish()
    }
}

/// Hand-advanced clock for expiry tests.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_clock(ttl_secs: u64) -> (ExpiringCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ExpiringCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_missing_key() {
        let (cache, _) = cache_with_clock(600);
        assert_eq!(cache.get(&"london".to_string()), None);
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let (cache, clock) = cache_with_clock(600);
        cache.set("london".to_string(), 21);

        clock.advance(Duration::from_secs(599));
        assert_eq!(cache.get(&"london".to_string()), Some(21));
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let (cache, clock) = cache_with_clock(600);
        cache.set("london".to_string(), 21);

        clock.advance(Duration::from_secs(600));
        assert_eq!(cache.get(&"london".to_string()), None);
        // Evicted on access
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_stays_until_accessed() {
        let (cache, clock) = cache_with_clock(10);
        cache.set("paris".to_string(), 1);
        cache.set("berlin".to_string(), 2);

        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get(&"paris".to_string()), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(10);
        cache.set("tokyo".to_string(), 1);
        clock.advance(Duration::from_secs(8));
        cache.set("tokyo".to_string(), 2);
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get(&"tokyo".to_string()), Some(2));
    }

    #[test]
    fn test_clear() {
        let (cache, _) = cache_with_clock(600);
        cache.set("dubai".to_string(), 1);
        cache.set("sydney".to_string(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"dubai".to_string()), None);
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let (cache, _) = cache_with_clock(0);
        cache.set("london".to_string(), 21);
        assert_eq!(cache.get(&"london".to_string()), None);
    }
}
