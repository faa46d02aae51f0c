//! Cache Module
//!
//! LRU storage plus the two concurrency-safe cache variants built on it:
//! [`EvictingCache`] and [`TtlCache`].

mod entry;
mod evicting;
mod guarded;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::Expiring;
pub use evicting::EvictingCache;
pub use stats::CacheStats;
pub use store::{LruStore, OnEvict};
pub use ttl::TtlCache;
