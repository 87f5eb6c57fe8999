//! Always-miss cache store used when no real backend is reachable.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::ports::{CacheResult, CacheStore};

/// Reports every key as absent and accepts every write.
///
/// With this store every range query reads the whole range from the backing
/// store, which is exactly the degraded behavior wanted when the cache is
/// down.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCacheStore;

#[async_trait]
impl CacheStore for NoOpCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn flush(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "noop"
    }
}
