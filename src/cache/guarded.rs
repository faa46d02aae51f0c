//! Guarded Store Module
//!
//! Reader/writer lock around an [`LruStore`], shared by both cache variants.

use std::borrow::Borrow;
use std::hash::Hash;

use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::cache::{CacheStats, LruStore};
use crate::error::Result;

// == Guarded Store ==
/// Serializes access to one store.
///
/// Mutations and recency-affecting lookups take the write lock; `peek`,
/// `len` and `stats` take the read lock and may run alongside each other.
pub(crate) struct GuardedStore<K, S> {
    inner: RwLock<LruStore<K, S>>,
}

impl<K: Hash + Eq, S> GuardedStore<K, S> {
    pub(crate) fn new(store: LruStore<K, S>) -> Self {
        Self {
            inner: RwLock::new(store),
        }
    }

    pub(crate) async fn add(&self, key: K, value: S) {
        self.inner.write().await.add(key, value);
    }

    /// Recency-affecting lookup; `f` projects the stored value while locked.
    pub(crate) async fn get_with<Q, R>(&self, key: &Q, f: impl FnOnce(&S) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().await.get(key).map(f)
    }

    pub(crate) async fn peek_with<Q, R>(&self, key: &Q, f: impl FnOnce(&S) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().await.peek(key).map(f)
    }

    pub(crate) async fn remove<Q>(&self, key: &Q) -> Option<S>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().await.remove(key)
    }

    pub(crate) async fn purge(&self) {
        self.inner.write().await.purge();
    }

    pub(crate) async fn close(&self) -> Result<()> {
        self.inner.write().await.close()
    }

    /// Exclusive access for operations that need several store calls at once.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, LruStore<K, S>> {
        self.inner.write().await
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub(crate) async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}
