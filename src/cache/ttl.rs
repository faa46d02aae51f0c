//! TTL Cache Module
//!
//! Evicting LRU cache whose entries also expire a fixed time after insertion.
//! Expiry is lazy: stale entries are dropped by the `get` that finds them.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

use prometheus::Registry;
use tracing::{debug, info};

use crate::cache::guarded::GuardedStore;
use crate::cache::{CacheStats, Expiring, LruStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{EvictionCallback, EvictionDispatcher};

// == TTL Cache ==
/// LRU cache with per-entry time-to-live and eviction notifications.
///
/// `get` never returns an expired value. `peek` does no freshness check and
/// never removes anything, so it can return a value whose TTL has elapsed.
/// Expired entries removed by `get` are not reported to the eviction callback.
pub struct TtlCache<K, V> {
    store: GuardedStore<K, Expiring<V>>,
    dispatcher: EvictionDispatcher<K, V>,
    ttl: Duration,
    name: String,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache using `config.ttl` as the lifetime of every entry.
    pub fn new(
        config: CacheConfig,
        registry: &Registry,
        on_evict: Option<EvictionCallback<K, V>>,
    ) -> Result<Self> {
        config.validate()?;
        if config.ttl.is_zero() {
            return Err(CacheError::InvalidArgument(
                "ttl must be greater than 0".to_string(),
            ));
        }
        let dispatcher =
            EvictionDispatcher::new(&config.name, config.eviction_concurrency, on_evict)?;

        // The user never sees the deadline wrapper
        let hook = dispatcher.clone();
        let store = LruStore::new(
            registry,
            &config.name,
            config.max_entries,
            Box::new(move |key, entry: Expiring<V>| hook.dispatch(key, entry.into_value())),
        )?;

        info!(
            "TTL cache '{}' created: max_entries={}, ttl={:?}, eviction_concurrency={}",
            config.name, config.max_entries, config.ttl, config.eviction_concurrency
        );

        Ok(Self {
            store: GuardedStore::new(store),
            dispatcher,
            ttl: config.ttl,
            name: config.name,
        })
    }

    // == Add ==
    /// Stores a value with a deadline of now + ttl, replacing any previous
    /// value and deadline for the key.
    pub async fn add(&self, key: K, value: V) {
        self.store.add(key, Expiring::new(value, self.ttl)).await;
    }

    // == Get ==
    /// Looks up a live value and marks it most recently used.
    ///
    /// An expired entry is removed and reported as absent. The check and the
    /// removal happen under one write lock, so a concurrent re-add of the key
    /// cannot be lost.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut store = self.store.write().await;

        if store.peek(key).is_some_and(Expiring::is_expired) {
            store.expire(key);
            debug!("Cache '{}': expired entry removed on lookup", self.name);
            return None;
        }
        store.get(key).map(|entry| entry.value().clone())
    }

    // == Peek ==
    /// Returns the stored value without checking its deadline or touching
    /// recency.
    pub async fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.store
            .peek_with(key, |entry| entry.value().clone())
            .await
    }

    // == Remove ==
    /// Removes an entry, returning its value. The eviction callback does not fire.
    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.remove(key).await.map(Expiring::into_value)
    }

    // == Purge ==
    /// Removes every entry without eviction callbacks.
    pub async fn purge(&self) {
        self.store.purge().await;
        debug!("TTL cache '{}' purged", self.name);
    }

    // == Close ==
    /// Purges the cache and unregisters its metrics, propagating any
    /// registry error. Evictions from before the call are still delivered.
    pub async fn close(&self) -> Result<()> {
        let result = self.store.close().await;
        self.dispatcher.shutdown();
        info!("TTL cache '{}' closed", self.name);
        result
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
