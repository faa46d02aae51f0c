//! Evict Cache - concurrency-safe LRU caches with eviction notifications
//!
//! Wraps a fixed-capacity LRU store with a reader/writer lock, delivers
//! eviction events to a user callback asynchronously with bounded
//! concurrency, and optionally expires entries lazily after a TTL.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, EvictingCache, TtlCache};
pub use config::{CacheConfig, DEFAULT_EVICTION_CONCURRENCY};
pub use error::{CacheError, Result};
pub use tasks::EvictionCallback;
