//! Eviction Storm - drives a cache far past capacity from several writers
//!
//! Shows that writers never wait on slow eviction callbacks and that the
//! callbacks never exceed the configured concurrency.
//!
//! Run with `cargo run --example eviction_storm`; tune with the `CACHE_*`
//! environment variables and `RUST_LOG`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use evict_cache::{CacheConfig, EvictingCache, EvictionCallback, TtlCache};
use prometheus::Registry;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WRITERS: u64 = 8;
const WRITES_PER_WRITER: u64 = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evict_cache=info,eviction_storm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: name={}, max_entries={}, ttl={:?}, eviction_concurrency={}",
        config.name, config.max_entries, config.ttl, config.eviction_concurrency
    );

    let registry = Registry::new();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(AtomicUsize::new(0));

    let on_evict: EvictionCallback<u64, String> = {
        let (running, peak, delivered) = (running.clone(), peak.clone(), delivered.clone());
        Arc::new(move |_key, _value| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            // Stand-in for releasing an external resource
            std::thread::sleep(Duration::from_millis(2));
            running.fetch_sub(1, Ordering::SeqCst);
            delivered.fetch_add(1, Ordering::SeqCst);
        })
    };

    let cache = Arc::new(
        EvictingCache::new(config.clone(), &registry, Some(on_evict))
            .context("failed to build evicting cache")?,
    );

    let started = Instant::now();
    let mut writers = Vec::new();
    for writer in 0..WRITERS {
        let cache = cache.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..WRITES_PER_WRITER {
                let key = writer * WRITES_PER_WRITER + i;
                cache.add(key, format!("payload-{key}")).await;
                if i % 3 == 0 {
                    cache.get(&key).await;
                }
            }
        }));
    }
    for writer in writers {
        writer.await.context("writer task failed")?;
    }
    info!("Writers finished in {:?}", started.elapsed());

    let stats = cache.stats().await;
    while delivered.load(Ordering::SeqCst) < stats.evictions as usize {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    info!(
        "Eviction callbacks delivered={} peak_concurrency={} limit={}",
        delivered.load(Ordering::SeqCst),
        peak.load(Ordering::SeqCst),
        config.eviction_concurrency
    );
    info!(
        "Stats: hits={} misses={} evictions={} entries={} hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.total_entries,
        stats.hit_rate()
    );
    cache.close().await.context("failed to close evicting cache")?;

    // Short-lived TTL cache alongside, sharing the registry
    let ttl_config = CacheConfig::new(64)
        .with_name(format!("{}_ttl", config.name))
        .with_ttl(Duration::from_millis(50));
    let on_ttl_evict: EvictionCallback<u64, String> = Arc::new(|_, _| {});
    let ttl_cache = TtlCache::new(ttl_config, &registry, Some(on_ttl_evict))
        .context("failed to build ttl cache")?;

    ttl_cache.add(1, "fresh".to_string()).await;
    info!("TTL get before deadline: {:?}", ttl_cache.get(&1).await);
    tokio::time::sleep(Duration::from_millis(60)).await;
    info!("TTL peek after deadline: {:?}", ttl_cache.peek(&1).await);
    info!("TTL get after deadline: {:?}", ttl_cache.get(&1).await);
    ttl_cache.close().await.context("failed to close ttl cache")?;

    Ok(())
}
