//! Common test utilities for integration tests
//!
//! Port doubles that count, record, fail or stall, plus fixtures over the
//! in-memory SQLite store.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use graphpoint::adapters::cache::MokaCacheStore;
use graphpoint::adapters::sqlite::{create_migrated_test_pool, SqliteGraphRepository};
use graphpoint::domain::models::{Category, DataPoint, DateKey, StoredPoint};
use graphpoint::domain::ports::{CacheError, CacheResult, CacheStore, GraphRepository};
use graphpoint::domain::DomainResult;

/// Shorthand for a valid calendar day.
pub fn day(y: i32, m: u32, d: u32) -> DateKey {
    DateKey::from_ymd(y, m, d).expect("valid date")
}

/// Fresh migrated in-memory store seeded with `(category, long-form date, x, y)` rows.
pub async fn seeded_repository(rows: &[(Category, &str, i64, i64)]) -> SqliteGraphRepository {
    let pool = create_migrated_test_pool().await.expect("test pool");
    let repo = SqliteGraphRepository::new(pool);
    for &(category, timestamp, x, y) in rows {
        repo.insert(category, timestamp, DataPoint::new(x, y))
            .await
            .expect("seed insert");
    }
    repo
}

/// Records every batch the orchestrator sends to the backing store.
pub struct CountingRepository<R> {
    inner: R,
    batches: Mutex<Vec<Vec<String>>>,
}

impl<R> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: GraphRepository> GraphRepository for CountingRepository<R> {
    async fn find_by_dates(&self, category: Category, timestamps: &[String]) -> DomainResult<Vec<StoredPoint>> {
        self.batches.lock().unwrap().push(timestamps.to_vec());
        self.inner.find_by_dates(category, timestamps).await
    }

    async fn exists(&self, category: Category, timestamp: &str) -> DomainResult<bool> {
        self.inner.exists(category, timestamp).await
    }

    async fn insert(&self, category: Category, timestamp: &str, point: DataPoint) -> DomainResult<()> {
        self.inner.insert(category, timestamp, point).await
    }

    async fn list(&self, category: Category) -> DomainResult<Vec<DataPoint>> {
        self.inner.list(category).await
    }
}

/// Backing store whose reads stall for `delay`.
pub struct SlowRepository<R> {
    pub inner: R,
    pub delay: Duration,
}

#[async_trait]
impl<R: GraphRepository> GraphRepository for SlowRepository<R> {
    async fn find_by_dates(&self, category: Category, timestamps: &[String]) -> DomainResult<Vec<StoredPoint>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_dates(category, timestamps).await
    }

    async fn exists(&self, category: Category, timestamp: &str) -> DomainResult<bool> {
        self.inner.exists(category, timestamp).await
    }

    async fn insert(&self, category: Category, timestamp: &str, point: DataPoint) -> DomainResult<()> {
        self.inner.insert(category, timestamp, point).await
    }

    async fn list(&self, category: Category) -> DomainResult<Vec<DataPoint>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list(category).await
    }
}

/// In-memory cache that records every write and counts reads.
#[derive(Default)]
pub struct RecordingCache {
    inner: MokaCacheStore,
    gets: AtomicUsize,
    writes: Mutex<Vec<(String, Duration)>>,
}

impl RecordingCache {
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn written_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.writes().into_iter().map(|(key, _)| key).collect();
        keys.sort();
        keys
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    /// Store `point` under `key` without recording the write.
    pub async fn seed(&self, key: &str, point: DataPoint) {
        self.seed_raw(key, &point.to_cache_value().unwrap()).await;
    }

    pub async fn seed_raw(&self, key: &str, bytes: &[u8]) {
        self.inner
            .set(key, bytes.to_vec(), Duration::from_secs(3600))
            .await
            .unwrap();
    }

    pub async fn point(&self, key: &str) -> Option<DataPoint> {
        let bytes = self.inner.get(key).await.unwrap()?;
        DataPoint::from_cache_value(&bytes).ok()
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.delete(key).await
    }

    async fn flush(&self) -> CacheResult<()> {
        self.inner.flush().await
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

/// Cache whose every call fails as if the server were down.
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    fn refuse(&self) -> CacheError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable("connection refused".into())
    }
}

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(self.refuse())
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Err(self.refuse())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(self.refuse())
    }

    async fn flush(&self) -> CacheResult<()> {
        Err(self.refuse())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Cache whose reads and writes never finish within any reasonable deadline.
#[derive(Default)]
pub struct StallingCache {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
}

impl StallingCache {
    async fn stall(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for StallingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.stall().await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        self.stall().await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn flush(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "stalling"
    }
}

/// Upcast helper for wiring doubles into services.
pub fn as_cache<C: CacheStore + 'static>(cache: &Arc<C>) -> Arc<dyn CacheStore> {
    cache.clone()
}
