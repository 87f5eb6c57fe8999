//! Cache store port.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Error type for cache operations.
///
/// Callers on the read path treat every variant as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Keyed, TTL-capable byte store.
///
/// Implementations must be safe to share across concurrent requests; no
/// multi-key atomicity is expected.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` if present
    /// * `Ok(None)` if the store reports the key as absent
    /// * `Err(CacheError)` on I/O failure
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Drop every entry.
    async fn flush(&self) -> CacheResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
