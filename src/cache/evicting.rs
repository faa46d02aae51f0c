//! Evicting Cache Module
//!
//! Thread-safe LRU cache that notifies a callback, asynchronously and with
//! bounded concurrency, whenever an entry is evicted by capacity pressure.

use std::borrow::Borrow;
use std::hash::Hash;

use prometheus::Registry;
use tracing::{debug, info};

use crate::cache::guarded::GuardedStore;
use crate::cache::{CacheStats, LruStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{EvictionCallback, EvictionDispatcher};

// == Evicting Cache ==
/// LRU cache safe to share between tasks, with eviction notifications.
///
/// The eviction callback never runs while the cache lock is held and never
/// delays the `add` that caused the eviction. It fires at most once per
/// evicted entry, never for [`remove`](Self::remove), [`purge`](Self::purge)
/// or [`close`](Self::close), and in no particular order.
///
/// # Example
/// ```ignore
/// let on_evict: EvictionCallback<String, u64> = Arc::new(|key, _| println!("evicted {key}"));
/// let cache = EvictingCache::new(CacheConfig::new(2), &Registry::new(), Some(on_evict))?;
/// cache.add("a".to_string(), 1).await;
/// ```
pub struct EvictingCache<K, V> {
    store: GuardedStore<K, V>,
    dispatcher: EvictionDispatcher<K, V>,
    name: String,
}

impl<K, V> EvictingCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache bound to the current tokio runtime.
    ///
    /// Fails with [`CacheError::InvalidArgument`](crate::CacheError::InvalidArgument)
    /// when `on_evict` is `None` or the config is invalid, and with
    /// [`CacheError::Runtime`](crate::CacheError::Runtime) outside a runtime.
    pub fn new(
        config: CacheConfig,
        registry: &Registry,
        on_evict: Option<EvictionCallback<K, V>>,
    ) -> Result<Self> {
        config.validate()?;
        let dispatcher =
            EvictionDispatcher::new(&config.name, config.eviction_concurrency, on_evict)?;

        let hook = dispatcher.clone();
        let store = LruStore::new(
            registry,
            &config.name,
            config.max_entries,
            Box::new(move |key, value| hook.dispatch(key, value)),
        )?;

        info!(
            "Cache '{}' created: max_entries={}, eviction_concurrency={}",
            config.name, config.max_entries, config.eviction_concurrency
        );

        Ok(Self {
            store: GuardedStore::new(store),
            dispatcher,
            name: config.name,
        })
    }

    // == Add ==
    /// Stores a value, possibly evicting the least recently used entry.
    pub async fn add(&self, key: K, value: V) {
        self.store.add(key, value).await;
    }

    // == Get ==
    /// Looks up a value and marks it most recently used.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.store.get_with(key, V::clone).await
    }

    // == Peek ==
    /// Looks up a value without updating its recency.
    pub async fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.store.peek_with(key, V::clone).await
    }

    // == Remove ==
    /// Removes an entry, returning its value. The eviction callback does not fire.
    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.remove(key).await
    }

    // == Purge ==
    /// Removes every entry without eviction callbacks.
    pub async fn purge(&self) {
        self.store.purge().await;
        debug!("Cache '{}' purged", self.name);
    }

    // == Close ==
    /// Purges the cache and unregisters its metrics. Evictions that happened
    /// before the call are still delivered; later ones are not reported.
    pub async fn close(&self) -> Result<()> {
        let result = self.store.close().await;
        self.dispatcher.shutdown();
        info!("Cache '{}' closed", self.name);
        result
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
