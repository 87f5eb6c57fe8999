//! In-process cache store backed by a moka TTL cache.
//!
//! Each entry carries its own TTL through a moka `Expiry` policy, so the
//! day entries (60 min) and full-series listings (10 min) can share one
//! cache instance.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::ports::{CacheResult, CacheStore};

/// Default maximum number of entries.
const DEFAULT_MAX_CAPACITY: u64 = 100_000;

#[derive(Clone)]
struct CachedEntry {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with. Overwrites
/// restart the clock.
struct PerEntryTtl;

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// moka-backed [`CacheStore`].
#[derive(Clone)]
pub struct MokaCacheStore {
    entries: Cache<String, CachedEntry>,
}

impl MokaCacheStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Create a store holding at most `max_capacity` entries.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }

    /// Approximate number of live entries, after pending maintenance runs.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

impl Default for MokaCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).await.map(|entry| entry.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let entry = CachedEntry {
            bytes: Arc::from(value),
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn flush(&self) -> CacheResult<()> {
        self.entries.invalidate_all();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
