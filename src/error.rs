//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and teardown.
///
/// Lookup misses are not errors; `get` and `peek` report them as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A constructor argument or configuration value is unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No tokio runtime was available to run eviction callbacks on
    #[error("Runtime unavailable: {0}")]
    Runtime(String),

    /// Registering or unregistering store metrics failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
