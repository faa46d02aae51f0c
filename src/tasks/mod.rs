//! Background Tasks Module
//!
//! Detached work spawned by the caches.
//!
//! # Tasks
//! - Eviction dispatch: runs user eviction callbacks with bounded concurrency

mod dispatcher;

pub use dispatcher::{EvictionCallback, EvictionDispatcher};
