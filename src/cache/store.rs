//! Cache Store Module
//!
//! Fixed-capacity LRU storage with a synchronous eviction hook and metrics.
//! Not safe for concurrent use on its own; the caches wrap it in a lock.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use prometheus::Registry;

use crate::cache::stats::{CacheStats, StoreMetrics};
use crate::error::{CacheError, Result};

/// Hook invoked while the store is being mutated, once per evicted entry.
pub type OnEvict<K, V> = Box<dyn Fn(K, V) + Send + Sync + 'static>;

// == LRU Store ==
/// LRU storage that reports capacity-driven evictions.
///
/// `on_evict` fires exactly once for every entry pushed out because the store
/// is full. It never fires for [`remove`](Self::remove), [`expire`](Self::expire),
/// [`purge`](Self::purge), [`close`](Self::close), or for the old value replaced
/// by re-adding an existing key.
pub struct LruStore<K, V> {
    /// Entries in recency order
    entries: LruCache<K, V>,
    /// Eviction hook
    on_evict: OnEvict<K, V>,
    /// Instruments registered with the caller's registry
    metrics: StoreMetrics,
}

impl<K: Hash + Eq, V> LruStore<K, V> {
    // == Constructor ==
    /// Creates a new store and registers its metrics.
    ///
    /// # Arguments
    /// * `registry` - Registry the store's instruments are added to
    /// * `name` - Value of the `cache` label on every instrument
    /// * `max_entries` - Maximum number of entries the store can hold
    /// * `on_evict` - Hook run for each capacity-driven eviction
    pub fn new(
        registry: &Registry,
        name: &str,
        max_entries: usize,
        on_evict: OnEvict<K, V>,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_entries).ok_or_else(|| {
            CacheError::InvalidArgument("max_entries must be greater than 0".to_string())
        })?;

        Ok(Self {
            entries: LruCache::new(capacity),
            on_evict,
            metrics: StoreMetrics::register(registry, name)?,
        })
    }

    // == Add ==
    /// Stores a key-value pair and marks it most recently used.
    ///
    /// If the key already exists its value is replaced. Otherwise, if the store
    /// is at capacity, the least recently used entry is evicted and handed to
    /// the hook.
    pub fn add(&mut self, key: K, value: V) {
        if self.entries.contains(&key) {
            self.entries.put(key, value);
        } else if let Some((evicted_key, evicted_value)) = self.entries.push(key, value) {
            self.metrics.record_eviction();
            (self.on_evict)(evicted_key, evicted_value);
        }
        self.metrics.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.entries.get(key);
        if found.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }
        found
    }

    // == Peek ==
    /// Retrieves a value without touching recency or metrics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.peek(key)
    }

    // == Remove ==
    /// Removes an entry by key, returning its value. Never fires the hook.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.pop(key);
        self.metrics.set_total_entries(self.entries.len());
        removed
    }

    // == Expire ==
    /// Removes an entry whose TTL elapsed, counting the lookup as a miss.
    pub fn expire<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.remove(key);
        if removed.is_some() {
            self.metrics.record_expiration();
        }
        self.metrics.record_miss();
        removed
    }

    // == Purge ==
    /// Removes every entry without firing the hook.
    pub fn purge(&mut self) {
        self.entries.clear();
        self.metrics.set_total_entries(0);
    }

    // == Close ==
    /// Purges the store and unregisters its metrics. Safe to call twice.
    pub fn close(&mut self) -> Result<()> {
        self.purge();
        self.metrics.unregister()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Evicted = Arc<Mutex<Vec<(String, u32)>>>;

    fn recording_store(max_entries: usize) -> (LruStore<String, u32>, Evicted) {
        let evicted: Evicted = Arc::default();
        let sink = evicted.clone();
        let store = LruStore::new(
            &Registry::new(),
            "store_test",
            max_entries,
            Box::new(move |k: String, v: u32| sink.lock().unwrap().push((k, v))),
        )
        .unwrap();
        (store, evicted)
    }

    #[test]
    fn test_store_new() {
        let (store, _) = recording_store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_store_zero_capacity_rejected() {
        let result =
            LruStore::<String, u32>::new(&Registry::new(), "zero", 0, Box::new(|_, _| {}));
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_store_add_and_get() {
        let (mut store, _) = recording_store(100);

        store.add("key1".to_string(), 1);
        assert_eq!(store.get("key1"), Some(&1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = recording_store(100);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite_does_not_evict() {
        let (mut store, evicted) = recording_store(2);

        store.add("key1".to_string(), 1);
        store.add("key2".to_string(), 2);
        store.add("key1".to_string(), 10);

        assert_eq!(store.get("key1"), Some(&10));
        assert_eq!(store.len(), 2);
        assert!(evicted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_lru_eviction() {
        let (mut store, evicted) = recording_store(2);

        store.add("a".to_string(), 1);
        store.add("b".to_string(), 2);
        store.add("c".to_string(), 3);

        assert_eq!(*evicted.lock().unwrap(), vec![("a".to_string(), 1)]);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("c"), Some(&3));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let (mut store, evicted) = recording_store(3);

        store.add("key1".to_string(), 1);
        store.add("key2".to_string(), 2);
        store.add("key3".to_string(), 3);

        // Access key1 to make it most recently used
        store.get("key1");

        // Adding key4 should evict key2 (now oldest)
        store.add("key4".to_string(), 4);

        assert_eq!(*evicted.lock().unwrap(), vec![("key2".to_string(), 2)]);
        assert!(store.get("key1").is_some());
    }

    #[test]
    fn test_store_peek_does_not_touch() {
        let (mut store, evicted) = recording_store(2);

        store.add("key1".to_string(), 1);
        store.add("key2".to_string(), 2);

        assert_eq!(store.peek("key1"), Some(&1));
        store.add("key3".to_string(), 3);

        // key1 stayed least recently used
        assert_eq!(*evicted.lock().unwrap(), vec![("key1".to_string(), 1)]);
        let stats = store.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[test]
    fn test_store_remove_and_purge_never_evict() {
        let (mut store, evicted) = recording_store(3);

        store.add("key1".to_string(), 1);
        store.add("key2".to_string(), 2);
        store.add("key3".to_string(), 3);

        assert_eq!(store.remove("key1"), Some(1));
        assert_eq!(store.remove("key1"), None);
        store.purge();

        assert!(store.is_empty());
        assert!(evicted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_expire_counts_miss() {
        let (mut store, evicted) = recording_store(3);

        store.add("key1".to_string(), 1);
        assert_eq!(store.expire("key1"), Some(1));

        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 0);
        assert!(evicted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_store_close_unregisters() {
        let registry = Registry::new();
        let mut store =
            LruStore::<String, u32>::new(&registry, "closing", 4, Box::new(|_, _| {})).unwrap();

        store.add("key1".to_string(), 1);
        store.close().unwrap();
        store.close().unwrap();

        assert!(store.is_empty());
        assert!(registry.gather().is_empty());
    }
}
