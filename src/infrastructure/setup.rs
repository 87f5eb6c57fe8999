//! Application wiring and project initialization
//!
//! Builds the shared adapters (pool, cache, live update bus) from a loaded
//! [`Config`] and hands out services over them.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::cache::{MokaCacheStore, NoOpCacheStore};
use crate::adapters::sqlite::{initialize_database, SqliteGraphRepository};
use crate::domain::models::{CacheConfig, Config};
use crate::domain::ports::CacheStore;
use crate::services::{
    LiveUpdateBus, LiveUpdateConfig, PointService, PointServiceConfig, RangeQueryConfig,
    RangeQueryService,
};

/// Default configuration template content
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# graphpoint configuration
# Override settings by editing this file or setting environment variables
# with the GRAPHPOINT_ prefix, e.g.
#   export GRAPHPOINT_SERVER__PORT=9000
#   export GRAPHPOINT_CACHE__BACKEND=redis
#   export GRAPHPOINT_CACHE__URL=redis://127.0.0.1:6379/

server:
  host: "127.0.0.1"
  port: 8080
  enable_cors: true
  # Upper bound on handling one request
  request_timeout_ms: 5000

database:
  path: ".graphpoint/graphpoint.db"
  max_connections: 10
  # How long to wait on a locked database
  busy_timeout_ms: 5000

cache:
  # memory, redis or none
  backend: "memory"
  # Per-day entries
  day_ttl_secs: 3600
  # Full-series listings
  listing_ttl_secs: 600
  # Upper bound on a single cache call
  op_timeout_ms: 500

query:
  # Longest accepted range, bounds included
  max_range_days: 366

logging:
  # trace, debug, info, warn, error
  level: "info"
  # json or pretty
  format: "json"
  # daily, hourly or never (only used with log_dir)
  rotation: "daily"
"#;

/// Write `config.yaml` into `dir`, creating the directory if needed.
///
/// An existing file is kept unless `force` is set.
pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join("config.yaml");
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Connect the configured cache backend.
///
/// A backend that cannot be reached is replaced by [`NoOpCacheStore`]:
/// every lookup misses and queries are served by the backing store.
pub async fn connect_cache(config: &CacheConfig) -> Arc<dyn CacheStore> {
    match config.backend.as_str() {
        "none" => Arc::new(NoOpCacheStore),
        "redis" => connect_redis(config).await,
        _ => Arc::new(MokaCacheStore::with_capacity(config.max_capacity)),
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &CacheConfig) -> Arc<dyn CacheStore> {
    use crate::adapters::cache::RedisCacheStore;

    let Some(url) = config.url.as_deref() else {
        warn!("redis cache selected without a url, caching disabled");
        return Arc::new(NoOpCacheStore);
    };

    match tokio::time::timeout(config.op_timeout() * 4, RedisCacheStore::connect(url)).await {
        Ok(Ok(store)) => Arc::new(store),
        Ok(Err(e)) => {
            warn!(error = %e, "redis unavailable, caching disabled");
            Arc::new(NoOpCacheStore)
        }
        Err(_) => {
            warn!("redis connection timed out, caching disabled");
            Arc::new(NoOpCacheStore)
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(config: &CacheConfig) -> Arc<dyn CacheStore> {
    warn!("built without the redis feature, falling back to the in-memory cache");
    Arc::new(MokaCacheStore::with_capacity(config.max_capacity))
}

/// Shared adapters for one process.
pub struct AppContext {
    pub config: Config,
    pub cache: Arc<dyn CacheStore>,
    pub repository: Arc<SqliteGraphRepository>,
    pub live_updates: Arc<LiveUpdateBus>,
}

impl AppContext {
    /// Open the database, run migrations and connect the cache.
    pub async fn build(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .context("Failed to initialize database")?;

        let cache = connect_cache(&config.cache).await;
        info!(
            database = %config.database.path,
            cache = cache.backend_name(),
            "application context ready"
        );

        Ok(Self::from_parts(config, cache, Arc::new(SqliteGraphRepository::new(pool))))
    }

    /// Assemble a context from already constructed adapters.
    pub fn from_parts(config: Config, cache: Arc<dyn CacheStore>, repository: Arc<SqliteGraphRepository>) -> Self {
        let live_updates = Arc::new(LiveUpdateBus::new(LiveUpdateConfig {
            channel_capacity: config.server.live_update_capacity,
        }));
        Self {
            config,
            cache,
            repository,
            live_updates,
        }
    }

    pub fn range_query_service(&self) -> RangeQueryService<SqliteGraphRepository> {
        RangeQueryService::new(
            self.cache.clone(),
            self.repository.clone(),
            RangeQueryConfig::from(&self.config.cache),
        )
    }

    pub fn point_service(&self) -> PointService<SqliteGraphRepository> {
        PointService::new(
            self.cache.clone(),
            self.repository.clone(),
            self.live_updates.clone(),
            PointServiceConfig::from(&self.config.cache),
        )
    }
}
