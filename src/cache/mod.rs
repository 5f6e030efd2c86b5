pub mod key;
pub mod memo;
pub mod memory;

pub use key::make_cache_key;
pub use memo::{create_memory_cache, KeyLocks, Memoizer, DEFAULT_TTL};
pub use memory::MemoryCache;

use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

static GLOBAL_CACHE: Lazy<Arc<MemoryCache<Value>>> = Lazy::new(|| Arc::new(MemoryCache::new()));

/// Process-wide store shared by every [`memory_cache`] memoizer.
pub fn global_cache() -> Arc<MemoryCache<Value>> {
    Arc::clone(&GLOBAL_CACHE)
}

/// Memoizer over the process-wide store.
pub fn memory_cache(ttl: Duration, prefix: &str) -> Memoizer<Value> {
    Memoizer::new(global_cache(), ttl, prefix)
}

pub fn clear_memory_cache() {
    GLOBAL_CACHE.clear();
}
