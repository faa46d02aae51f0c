//! Eviction Dispatcher
//!
//! Turns the store's synchronous eviction hook into throttled, detached
//! delivery to the user's callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// User callback run for every entry evicted by capacity pressure.
pub type EvictionCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync + 'static>;

// == Eviction Dispatcher ==
/// Runs eviction callbacks off the caller's critical section with at most
/// `permits` of them executing at any moment.
///
/// Each [`dispatch`](Self::dispatch) spawns a task that waits for a permit,
/// then runs the callback on the blocking pool. The permit is moved into the
/// blocking closure, so it is released when the callback returns or unwinds.
/// After [`shutdown`](Self::shutdown), new events are dropped; events
/// dispatched before it still wait for a permit and are delivered.
pub struct EvictionDispatcher<K, V> {
    callback: EvictionCallback<K, V>,
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    permits: usize,
    runtime: Handle,
    name: Arc<str>,
}

impl<K, V> Clone for EvictionDispatcher<K, V> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            semaphore: self.semaphore.clone(),
            closed: self.closed.clone(),
            permits: self.permits,
            runtime: self.runtime.clone(),
            name: self.name.clone(),
        }
    }
}

impl<K, V> EvictionDispatcher<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    // == Constructor ==
    /// Creates a dispatcher bound to the current tokio runtime.
    ///
    /// # Arguments
    /// * `name` - Cache name used in log lines
    /// * `permits` - Maximum number of concurrently running callbacks
    /// * `callback` - User callback; `None` is rejected
    pub fn new(
        name: &str,
        permits: usize,
        callback: Option<EvictionCallback<K, V>>,
    ) -> Result<Self> {
        let callback = callback.ok_or_else(|| {
            CacheError::InvalidArgument("eviction callback must not be None".to_string())
        })?;
        if permits == 0 {
            return Err(CacheError::InvalidArgument(
                "eviction_concurrency must be greater than 0".to_string(),
            ));
        }
        let runtime = Handle::try_current().map_err(|err| CacheError::Runtime(err.to_string()))?;

        Ok(Self {
            callback,
            semaphore: Arc::new(Semaphore::new(permits)),
            closed: Arc::new(AtomicBool::new(false)),
            permits,
            runtime,
            name: Arc::from(name),
        })
    }

    // == Dispatch ==
    /// Schedules the callback for an evicted entry and returns immediately.
    pub fn dispatch(&self, key: K, value: V) {
        if self.closed.load(Ordering::Acquire) {
            debug!("Cache '{}': dispatcher shut down, eviction notification dropped", self.name);
            return;
        }
        debug!("Cache '{}': eviction handed off to dispatcher", self.name);

        let callback = self.callback.clone();
        let semaphore = self.semaphore.clone();
        let name = self.name.clone();

        self.runtime.spawn(async move {
            // The pool is never closed, so acquisition only waits
            let Ok(permit) = semaphore.acquire_owned().await else {
                warn!("Cache '{}': permit pool closed, eviction notification dropped", name);
                return;
            };

            let outcome = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                callback(key, value);
            })
            .await;

            if let Err(err) = outcome {
                warn!("Cache '{}': eviction callback failed: {}", name, err);
            }
        });
    }

    // == Shutdown ==
    /// Stops accepting new events. Events already dispatched, running or
    /// waiting for a permit, are still delivered.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of callbacks executing right now.
    pub fn in_flight(&self) -> usize {
        self.permits - self.semaphore.available_permits()
    }
}
