//! Insert path, full-series listing and cache maintenance.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CacheConfig, Category, DataPoint, DateKey, PointEvent};
use crate::domain::ports::{CacheError, CacheStore, GraphRepository};
use crate::services::live_updates::LiveUpdateBus;

/// Cache key of the full-series listing for a category.
pub fn listing_key(category: Category) -> String {
    format!("data:{category}")
}

#[derive(Debug, Clone)]
pub struct PointServiceConfig {
    pub listing_ttl: Duration,
    pub cache_op_timeout: Duration,
}

impl Default for PointServiceConfig {
    fn default() -> Self {
        Self {
            listing_ttl: Duration::from_secs(10 * 60),
            cache_op_timeout: Duration::from_millis(500),
        }
    }
}

impl From<&CacheConfig> for PointServiceConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            listing_ttl: config.listing_ttl(),
            cache_op_timeout: config.op_timeout(),
        }
    }
}

pub struct PointService<R: GraphRepository> {
    cache: Arc<dyn CacheStore>,
    repository: Arc<R>,
    live_updates: Arc<LiveUpdateBus>,
    config: PointServiceConfig,
}

impl<R: GraphRepository> PointService<R> {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        repository: Arc<R>,
        live_updates: Arc<LiveUpdateBus>,
        config: PointServiceConfig,
    ) -> Self {
        Self {
            cache,
            repository,
            live_updates,
            config,
        }
    }

    /// Record one point for the calendar day of `timestamp`.
    ///
    /// A second point for the same category and day is rejected with
    /// `DuplicatePoint`. Per-day cache entries are left alone: a day only
    /// reaches the cache once the store holds it, and the store never
    /// accepts a second point for that day.
    #[instrument(skip(self), err)]
    pub async fn add_point(&self, category: Category, timestamp: &str, x: i64, y: i64) -> DomainResult<PointEvent> {
        let day = DateKey::parse_timestamp(timestamp)?;
        let stored_at = day.to_backing_param();

        if self.repository.exists(category, &stored_at).await? {
            return Err(DomainError::DuplicatePoint {
                category: category.to_string(),
                date: day.to_cache_form(),
            });
        }

        self.repository.insert(category, &stored_at, DataPoint::new(x, y)).await?;

        let key = listing_key(category);
        if let Err(e) = self.with_deadline(self.cache.delete(&key)).await {
            warn!(%key, error = %e, "failed to invalidate cached listing");
        }

        let event = PointEvent {
            x,
            y,
            timestamp: stored_at,
            graph_type: category,
        };
        let update = self.live_updates.publish(event.clone());
        info!(%category, day = %day, sequence = update.sequence, "point added");

        Ok(event)
    }

    /// Every point of `category`, ordered by date, served from the cache
    /// when a listing is present.
    #[instrument(skip(self))]
    pub async fn list_points(&self, category: Category) -> DomainResult<Vec<DataPoint>> {
        let key = listing_key(category);

        match self.with_deadline(self.cache.get(&key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<DataPoint>>(&bytes) {
                Ok(points) => return Ok(points),
                Err(e) => warn!(%key, error = %e, "discarding undecodable cached listing"),
            },
            Ok(None) => {}
            Err(e) => warn!(%key, error = %e, "cache lookup failed, reading from store"),
        }

        let points = self.repository.list(category).await?;

        let value = serde_json::to_vec(&points)?;
        if let Err(e) = self
            .with_deadline(self.cache.set(&key, value, self.config.listing_ttl))
            .await
        {
            warn!(%key, error = %e, "failed to cache listing");
        }

        Ok(points)
    }

    /// Drop every cache entry.
    pub async fn clear_cache(&self) -> DomainResult<()> {
        self.with_deadline(self.cache.flush())
            .await
            .map_err(|e| DomainError::CacheUnavailable(e.to_string()))?;
        info!(backend = self.cache.backend_name(), "cache cleared");
        Ok(())
    }

    pub fn live_updates(&self) -> &Arc<LiveUpdateBus> {
        &self.live_updates
    }

    async fn with_deadline<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        timeout(self.config.cache_op_timeout, op)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.config.cache_op_timeout)))
    }
}
