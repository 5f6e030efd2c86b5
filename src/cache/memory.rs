use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Thread-safe in-memory map with optional per-entry expiry.
///
/// Expired entries are dropped when they are next touched or by
/// [`MemoryCache::purge_expired`]; nothing runs in the background.
#[derive(Debug)]
pub struct MemoryCache<V> {
    store: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value for `key`.
    ///
    /// When `ttl` is given and the entry was stored without expiry, the entry
    /// starts expiring `ttl` from now.
    pub fn try_get(&self, key: &str, ttl: Option<Duration>) -> Option<V> {
        let now = Instant::now();
        let mut store = self.store.lock();

        let expired = store.get(key)?.is_expired(now);
        if expired {
            store.remove(key);
            return None;
        }

        let entry = store.get_mut(key)?;
        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) {
            if entry.expires_at.is_none() {
                entry.expires_at = Some(now + ttl);
            }
        }
        Some(entry.value.clone())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.try_get(key, None)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` with no expiry, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.store.lock().insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: None,
            },
        );
    }

    /// Stores `value` for `ttl`; a zero ttl behaves like [`MemoryCache::put`].
    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.store
            .lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn remove(&self, key: &str) -> bool {
        self.store.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.purge_expired();
        self.store.lock().len()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.lock();
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        before - store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_put_and_get() {
        let cache = MemoryCache::new();
        cache.put("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert!(cache.has("a"));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_entry_expires() {
        let cache = MemoryCache::new();
        cache.put_with_ttl("a", "value".to_string(), Duration::from_millis(30));
        assert_eq!(cache.get("a").as_deref(), Some("value"));

        sleep(Duration::from_millis(60));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.put_with_ttl("a", 1, Duration::ZERO);
        sleep(Duration::from_millis(10));
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn test_try_get_upgrades_entry_without_expiry() {
        let cache = MemoryCache::new();
        cache.put("a", 1);
        assert_eq!(cache.try_get("a", Some(Duration::from_millis(30))), Some(1));

        sleep(Duration::from_millis(60));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_put_replaces_expiry() {
        let cache = MemoryCache::new();
        cache.put_with_ttl("a", 1, Duration::from_millis(20));
        cache.put("a", 2);
        sleep(Duration::from_millis(40));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_purge_remove_and_clear() {
        let cache = MemoryCache::new();
        cache.put_with_ttl("short", 1, Duration::from_millis(10));
        cache.put("long", 2);
        cache.put("other", 3);
        sleep(Duration::from_millis(30));

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.remove("long"));
        assert!(!cache.remove("long"));
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }
}
