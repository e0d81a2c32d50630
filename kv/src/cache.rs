use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache as LruMap;

/// A side channel notified on committed-intent writes and deletes made
/// through the `Engine`. It never participates in locking, undo, or the
/// commit/rollback protocol, and it is never consulted for reads: it mirrors
/// writes for external consumers (hit-rate experiments, warm caches) rather
/// than serving as a source of truth.
pub trait CacheHook: Send + Sync {
    fn add(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// A bounded least-recently-used cache, grounded in the original store's
/// `LRUCache`: `add` evicts the least recently used entry once at capacity,
/// and both `add` and `remove` are no-ops that never panic on an empty or
/// already-evicted key.
pub struct LruCache {
    inner: Mutex<LruMap<String, String>>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: Mutex::new(LruMap::new(capacity)) }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl CacheHook for LruCache {
    fn add(&self, key: &str, value: &str) {
        self.inner.lock().unwrap().put(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.lock().unwrap().pop(key);
    }
}
