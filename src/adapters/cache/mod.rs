//! Cache store adapters.
//!
//! - `memory`: in-process moka cache with per-entry TTL (default)
//! - `redis`: shared Redis instance (`redis` cargo feature)
//! - `noop`: always-miss fallback when the configured backend is unreachable

pub mod moka_store;
pub mod noop_store;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use moka_store::MokaCacheStore;
pub use noop_store::NoOpCacheStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisCacheStore;
