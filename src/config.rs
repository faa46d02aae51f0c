//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default number of eviction callbacks allowed to run at once.
pub const DEFAULT_EVICTION_CONCURRENCY: usize = 5;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache name, used as the `cache` label on metrics and in log lines
    pub name: String,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Time-to-live applied to every entry of a TTL cache
    pub ttl: Duration,
    /// Maximum number of eviction callbacks executing concurrently
    pub eviction_concurrency: usize,
}

impl CacheConfig {
    /// Creates a default config with the given capacity.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Metrics label and log name (default: "default")
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `CACHE_EVICTION_CONCURRENCY` - Concurrent eviction callbacks (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("CACHE_NAME").unwrap_or(defaults.name),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            ttl: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.ttl),
            eviction_concurrency: env::var("CACHE_EVICTION_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.eviction_concurrency),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_eviction_concurrency(mut self, permits: usize) -> Self {
        self.eviction_concurrency = permits;
        self
    }

    // == Validate ==
    /// Checks the values shared by both cache variants.
    ///
    /// The TTL is only meaningful for [`crate::TtlCache`], which checks it separately.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidArgument(
                "max_entries must be greater than 0".to_string(),
            ));
        }
        if self.eviction_concurrency == 0 {
            return Err(CacheError::InvalidArgument(
                "eviction_concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_entries: 1000,
            ttl: Duration::from_secs(300),
            eviction_concurrency: DEFAULT_EVICTION_CONCURRENCY,
        }
    }
}
