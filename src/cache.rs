// src/cache.rs
//! Cache-aside store: read-through probe, write-back after compute.
//!
//! TTL is the sole eviction mechanism; entries are never explicitly
//! invalidated. There is deliberately no single-flight protection here:
//! concurrent misses for one region may each recompute and overwrite the
//! same key, which is idempotent and bounded.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

pub const DEFAULT_TTL_SECS: u64 = 300;
pub const ENV_CACHE_TTL_SECS: &str = "TIMELINE_CACHE_TTL_SECS";

/// Bumped whenever the serialized payload shape changes, so entries written
/// by the previous deploy can never satisfy a read from the new one.
pub const CACHE_SCHEMA_VERSION: &str = "v2";

pub fn cache_key(region: &str) -> String {
    format!("timeline:{CACHE_SCHEMA_VERSION}:{region}")
}

pub fn ttl_from_env() -> Duration {
    let secs = std::env::var(ENV_CACHE_TTL_SECS)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_TTL_SECS);
    Duration::from_secs(secs)
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored bytes for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    /// Store `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process key-value store with per-entry deadlines. Expired entries are
/// invisible to `get` immediately and swept out on the next `put`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let guard = self.entries.read().await;
        let entry = guard.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()> {
        let mut guard = self.entries.write().await;
        let now = Instant::now();
        guard.retain(|_, e| e.expires_at > now);
        guard.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}
