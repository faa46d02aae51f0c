//! Cache Statistics Module
//!
//! Prometheus instruments for a store plus a serializable snapshot of them.

use prometheus::{IntCounter, IntGauge, Opts, Registry};
use serde::Serialize;

use crate::error::Result;

/// Metric name prefix shared by every store.
const METRIC_PREFIX: &str = "evict_cache";

/// Number of instruments each store owns.
const INSTRUMENTS: usize = 5;

// == Cache Stats ==
/// Point-in-time view of a cache's performance counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of failed lookups (key absent or expired)
    pub misses: u64,
    /// Number of entries evicted due to capacity pressure
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Store Metrics ==
/// Counters owned by one store and registered with the caller's registry.
pub(crate) struct StoreMetrics {
    hits: IntCounter,
    misses: IntCounter,
    evictions: IntCounter,
    expirations: IntCounter,
    entries: IntGauge,
    /// Registry the instruments were added to; cleared once all are removed
    registry: Option<Registry>,
    /// Instruments already removed, in `collectors()` order
    unregistered: [bool; INSTRUMENTS],
}

impl StoreMetrics {
    /// Creates the instruments labelled with `cache=<name>` and registers them.
    pub(crate) fn register(registry: &Registry, name: &str) -> Result<Self> {
        let opts = |metric: &str, help: &str| {
            Opts::new(format!("{METRIC_PREFIX}_{metric}"), help).const_label("cache", name)
        };

        let metrics = Self {
            hits: IntCounter::with_opts(opts("hits_total", "Lookups that found a live entry"))?,
            misses: IntCounter::with_opts(opts(
                "misses_total",
                "Lookups that found no entry or an expired one",
            ))?,
            evictions: IntCounter::with_opts(opts(
                "evictions_total",
                "Entries evicted due to capacity pressure",
            ))?,
            expirations: IntCounter::with_opts(opts(
                "expirations_total",
                "Entries removed because their TTL elapsed",
            ))?,
            entries: IntGauge::with_opts(opts("entries", "Current number of entries"))?,
            registry: Some(registry.clone()),
            unregistered: [false; INSTRUMENTS],
        };

        for (index, collector) in metrics.collectors().into_iter().enumerate() {
            if let Err(err) = registry.register(collector) {
                // Roll back only what this store registered
                for registered in metrics.collectors().into_iter().take(index) {
                    let _ = registry.unregister(registered);
                }
                return Err(err.into());
            }
        }
        Ok(metrics)
    }

    /// Removes the instruments from the registry. Calling it twice is a no-op.
    ///
    /// On failure the registry is kept and a retry only touches the
    /// instruments that are still registered.
    pub(crate) fn unregister(&mut self) -> Result<()> {
        let Some(registry) = self.registry.clone() else {
            return Ok(());
        };

        let mut first_error = None;
        for (index, collector) in self.collectors().into_iter().enumerate() {
            if self.unregistered[index] {
                continue;
            }
            match registry.unregister(collector) {
                Ok(()) => self.unregistered[index] = true,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => {
                self.registry = None;
                Ok(())
            }
        }
    }

    fn collectors(&self) -> Vec<Box<dyn prometheus::core::Collector>> {
        vec![
            Box::new(self.hits.clone()),
            Box::new(self.misses.clone()),
            Box::new(self.evictions.clone()),
            Box::new(self.expirations.clone()),
            Box::new(self.entries.clone()),
        ]
    }

    pub(crate) fn record_hit(&self) {
        self.hits.inc();
    }

    pub(crate) fn record_miss(&self) {
        self.misses.inc();
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.inc();
    }

    pub(crate) fn record_expiration(&self) {
        self.expirations.inc();
    }

    pub(crate) fn set_total_entries(&self, count: usize) {
        self.entries.set(count as i64);
    }

    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            evictions: self.evictions.get(),
            expirations: self.expirations.get(),
            total_entries,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = StoreMetrics::register(&registry, "unit").unwrap();

        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_eviction();
        metrics.record_expiration();
        metrics.set_total_entries(7);

        let stats = metrics.snapshot(7);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 7);

        assert_eq!(registry.gather().len(), 5);
    }

    #[test]
    fn test_metrics_duplicate_name_rejected() {
        let registry = Registry::new();
        let _first = StoreMetrics::register(&registry, "dup").unwrap();

        let second = StoreMetrics::register(&registry, "dup");
        assert!(second.is_err());
    }

    #[test]
    fn test_metrics_distinct_names_share_registry() {
        let registry = Registry::new();
        let _a = StoreMetrics::register(&registry, "a").unwrap();
        let _b = StoreMetrics::register(&registry, "b").unwrap();
    }

    #[test]
    fn test_metrics_unregister_is_idempotent() {
        let registry = Registry::new();
        let mut metrics = StoreMetrics::register(&registry, "gone").unwrap();

        metrics.unregister().unwrap();
        metrics.unregister().unwrap();
        assert!(registry.gather().is_empty());

        // The name is free again
        let _again = StoreMetrics::register(&registry, "gone").unwrap();
    }

    #[test]
    fn test_metrics_unregister_retries_after_partial_failure() {
        let registry = Registry::new();
        let mut metrics = StoreMetrics::register(&registry, "partial").unwrap();

        // Someone else removed one instrument first
        registry
            .unregister(Box::new(metrics.evictions.clone()))
            .unwrap();
        assert!(metrics.unregister().is_err());
        assert!(registry.gather().is_empty());

        // Only the failed instrument is retried
        registry
            .register(Box::new(metrics.evictions.clone()))
            .unwrap();
        metrics.unregister().unwrap();
        assert!(registry.gather().is_empty());
        metrics.unregister().unwrap();
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            hits: 1,
            misses: 2,
            evictions: 3,
            expirations: 4,
            total_entries: 5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["evictions"], 3);
        assert_eq!(json["total_entries"], 5);
    }
}
