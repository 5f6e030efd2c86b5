use crate::cache::key::make_cache_key;
use crate::cache::memory::MemoryCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_LOCKS: usize = 10_000;

/// One async mutex per cache key, so a value is computed once even when
/// many tasks miss at the same time.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Forgets every lock once more than `max_locks` are held.
    ///
    /// Tasks already holding a lock keep their `Arc`; only new callers get fresh locks.
    pub fn cleanup(&self, max_locks: usize) {
        let mut locks = self.locks.lock();
        if locks.len() > max_locks {
            tracing::debug!("Clearing {} cache key locks", locks.len());
            locks.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caches results of computations in a [`MemoryCache`], keyed by function
/// name and arguments.
///
/// Clones share the same store and locks.
#[derive(Debug)]
pub struct Memoizer<V> {
    store: Arc<MemoryCache<V>>,
    locks: Arc<KeyLocks>,
    ttl: Duration,
    prefix: String,
    use_lock: bool,
    max_locks: usize,
}

impl<V> Clone for Memoizer<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            ttl: self.ttl,
            prefix: self.prefix.clone(),
            use_lock: self.use_lock,
            max_locks: self.max_locks,
        }
    }
}

impl<V: Clone> Memoizer<V> {
    pub fn new(store: Arc<MemoryCache<V>>, ttl: Duration, prefix: impl Into<String>) -> Self {
        Self {
            store,
            locks: Arc::new(KeyLocks::new()),
            ttl,
            prefix: prefix.into(),
            use_lock: true,
            max_locks: DEFAULT_MAX_LOCKS,
        }
    }

    /// Same store and locks with a different ttl (`None` keeps the current one) and prefix.
    pub fn scoped(&self, ttl: Option<Duration>, prefix: impl Into<String>) -> Self {
        Self {
            ttl: ttl.unwrap_or(self.ttl),
            prefix: prefix.into(),
            ..self.clone()
        }
    }

    /// Disables per-key locking for async calls; concurrent misses may then compute twice.
    pub fn with_locking(mut self, use_lock: bool) -> Self {
        self.use_lock = use_lock;
        self
    }

    pub fn with_max_locks(mut self, max_locks: usize) -> Self {
        self.max_locks = max_locks;
        self
    }

    pub fn store(&self) -> &Arc<MemoryCache<V>> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key_for<A: Serialize + Debug + ?Sized>(&self, name: &str, args: &A) -> String {
        make_cache_key(name, &self.prefix, args)
    }

    /// Returns the cached value for `name(args)` or computes and stores it.
    ///
    /// A zero ttl disables caching entirely.
    pub fn call<A, F>(&self, name: &str, args: &A, compute: F) -> V
    where
        A: Serialize + Debug + ?Sized,
        F: FnOnce() -> V,
    {
        if self.ttl.is_zero() {
            return compute();
        }

        let key = self.key_for(name, args);
        if let Some(cached) = self.store.try_get(&key, Some(self.ttl)) {
            tracing::debug!("Cache hit: {}", key);
            return cached;
        }

        tracing::debug!("Cache miss, computing: {}", key);
        let value = compute();
        self.store.put_with_ttl(key, value.clone(), self.ttl);
        value
    }

    pub async fn call_async<A, F, Fut>(&self, name: &str, args: &A, compute: F) -> V
    where
        A: Serialize + Debug + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let result = self
            .try_call_async(name, args, || async { Ok::<V, Infallible>(compute().await) })
            .await;
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Async variant for fallible computations. Errors are returned to the
    /// caller and never cached.
    pub async fn try_call_async<A, F, Fut, E>(&self, name: &str, args: &A, compute: F) -> Result<V, E>
    where
        A: Serialize + Debug + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if self.ttl.is_zero() {
            return compute().await;
        }

        let key = self.key_for(name, args);
        if let Some(cached) = self.store.try_get(&key, Some(self.ttl)) {
            tracing::debug!("Cache hit (fast path): {}", key);
            return Ok(cached);
        }

        if !self.use_lock {
            let value = compute().await?;
            self.store.put_with_ttl(key, value.clone(), self.ttl);
            return Ok(value);
        }

        let lock = self.locks.get_lock(&key);
        let _guard = lock.lock().await;

        // another task may have filled the entry while we waited
        if let Some(cached) = self.store.try_get(&key, Some(self.ttl)) {
            tracing::debug!("Cache hit (after lock): {}", key);
            return Ok(cached);
        }

        tracing::debug!("Cache miss, computing: {}", key);
        let value = compute().await?;
        self.store.put_with_ttl(key, value.clone(), self.ttl);
        self.locks.cleanup(self.max_locks);
        Ok(value)
    }
}

/// Memoizer over a fresh store with `default_ttl` and no prefix.
pub fn create_memory_cache<V: Clone>(default_ttl: Duration) -> Memoizer<V> {
    Memoizer::new(Arc::new(MemoryCache::new()), default_ttl, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_call_computes_once_per_args() {
        let memo = create_memory_cache::<u64>(DEFAULT_TTL);
        let calls = AtomicUsize::new(0);
        let square = |x: u64| {
            memo.call("square", &x, || {
                calls.fetch_add(1, Ordering::SeqCst);
                x * x
            })
        };

        assert_eq!(square(4), 16);
        assert_eq!(square(4), 16);
        assert_eq!(square(5), 25);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let memo = create_memory_cache::<u64>(Duration::ZERO);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            memo.call("f", &(), || calls.fetch_add(1, Ordering::SeqCst) as u64);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.store().size(), 0);
    }

    #[test]
    fn test_scoped_prefix_separates_entries() {
        let memo = create_memory_cache::<&'static str>(DEFAULT_TTL);
        let users = memo.scoped(None, "user");
        let orders = memo.scoped(Some(Duration::from_secs(5)), "order");

        assert_eq!(users.call("load", &1, || "alice"), "alice");
        assert_eq!(orders.call("load", &1, || "order-1"), "order-1");
        assert_eq!(users.call("load", &1, || "unused"), "alice");
        assert_eq!(orders.ttl(), Duration::from_secs(5));
        assert_eq!(memo.store().size(), 2);
    }

    #[test]
    fn test_key_locks_cleanup() {
        let locks = KeyLocks::new();
        for i in 0..5 {
            locks.get_lock(&format!("k{}", i));
        }
        locks.cleanup(10);
        assert_eq!(locks.len(), 5);
        locks.cleanup(3);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_same_key_returns_same_lock() {
        let locks = KeyLocks::new();
        assert!(Arc::ptr_eq(&locks.get_lock("a"), &locks.get_lock("a")));
        assert!(!Arc::ptr_eq(&locks.get_lock("a"), &locks.get_lock("b")));
    }

    #[tokio::test]
    async fn test_try_call_async_does_not_cache_errors() {
        let memo = create_memory_cache::<u32>(DEFAULT_TTL);
        let failed: Result<u32, String> = memo
            .try_call_async("load", &"id", || async { Err("boom".to_string()) })
            .await;
        assert!(failed.is_err());

        let ok: Result<u32, String> = memo.try_call_async("load", &"id", || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
        assert_eq!(memo.call_async("load", &"id", || async { 99 }).await, 7);
    }
}
