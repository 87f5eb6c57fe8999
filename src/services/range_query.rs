//! Cache-aside range query engine.
//!
//! A range query fans out one cache lookup per day, loads every missing day
//! from the backing store in a single batch, and writes those days back to
//! the cache. Each per-day future fills its own result slot and the slots
//! are merged sequentially after the join, so no lock guards the
//! accumulators.
//!
//! Only a backing-store failure fails the query. Cache errors, timeouts and
//! undecodable cached values degrade the affected day to a miss.

use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{cache_key, CacheConfig, Category, DataPoint, DateKey, DateRange};
use crate::domain::ports::{CacheError, CacheStore, GraphRepository};

/// Tuning for [`RangeQueryService`].
#[derive(Debug, Clone)]
pub struct RangeQueryConfig {
    /// TTL of the per-day entries written during repopulation.
    pub day_ttl: Duration,
    /// Upper bound on every single cache get/set.
    pub cache_op_timeout: Duration,
}

impl Default for RangeQueryConfig {
    fn default() -> Self {
        Self {
            day_ttl: Duration::from_secs(60 * 60),
            cache_op_timeout: Duration::from_millis(500),
        }
    }
}

impl From<&CacheConfig> for RangeQueryConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            day_ttl: config.day_ttl(),
            cache_op_timeout: config.op_timeout(),
        }
    }
}

/// Result of the read path over one range.
///
/// Every day of the range is in exactly one of `points` (cache hit) or
/// `misses`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RangeFetch {
    pub points: Vec<(DateKey, DataPoint)>,
    pub misses: BTreeSet<DateKey>,
}

enum DayLookup {
    Hit(DataPoint),
    Absent,
    /// Lookup failed or returned garbage; handled like `Absent`.
    Degraded,
}

/// Range query orchestrator.
pub struct RangeQueryService<R: GraphRepository> {
    cache: Arc<dyn CacheStore>,
    repository: Arc<R>,
    config: RangeQueryConfig,
}

impl<R: GraphRepository> RangeQueryService<R> {
    pub fn new(cache: Arc<dyn CacheStore>, repository: Arc<R>, config: RangeQueryConfig) -> Self {
        Self {
            cache,
            repository,
            config,
        }
    }

    /// Run the full cache-aside sequence for one range.
    ///
    /// Points come back sorted by date. Days with neither a cached value nor
    /// a backing row are simply absent from the result.
    #[instrument(skip_all, fields(category = %category, start = %range.start(), end = %range.end()))]
    pub async fn query(&self, category: Category, range: &DateRange) -> DomainResult<Vec<DataPoint>> {
        let RangeFetch { mut points, misses } = self.fetch_range(category, range).await;
        let hits = points.len();

        if !misses.is_empty() {
            let fills = self.load_missing(category, &misses).await?;
            self.repopulate(category, &fills, &mut points).await;
        }

        points.sort_by_key(|(date, _)| *date);
        debug!(
            days = range.len_days(),
            hits,
            misses = misses.len(),
            returned = points.len(),
            "range query complete"
        );

        Ok(points.into_iter().map(|(_, point)| point).collect())
    }

    /// Look up every day of `range` in the cache concurrently.
    pub async fn fetch_range(&self, category: Category, range: &DateRange) -> RangeFetch {
        let lookups = range
            .days()
            .map(|day| async move { (day, self.lookup_day(category, day).await) });

        let mut fetch = RangeFetch::default();
        for (day, outcome) in join_all(lookups).await {
            match outcome {
                DayLookup::Hit(point) => fetch.points.push((day, point)),
                DayLookup::Absent | DayLookup::Degraded => {
                    fetch.misses.insert(day);
                }
            }
        }
        fetch
    }

    /// Load the missing days from the backing store in one query.
    ///
    /// An empty miss set never reaches the store. Rows whose date cannot be
    /// parsed, or that fall outside the miss set, are skipped.
    pub async fn load_missing(
        &self,
        category: Category,
        misses: &BTreeSet<DateKey>,
    ) -> DomainResult<BTreeMap<DateKey, DataPoint>> {
        if misses.is_empty() {
            return Ok(BTreeMap::new());
        }

        let timestamps: Vec<String> = misses.iter().map(|day| day.to_backing_param()).collect();
        let rows = self.repository.find_by_dates(category, &timestamps).await?;

        let mut fills = BTreeMap::new();
        for row in rows {
            match DateKey::parse_backing(&row.timestamp) {
                Ok(day) if misses.contains(&day) => {
                    fills.insert(day, row.point());
                }
                Ok(day) => {
                    warn!(%category, %day, "backing store returned a date that was not requested");
                }
                Err(e) => {
                    warn!(%category, error = %e, "skipping backing row with malformed date");
                }
            }
        }
        Ok(fills)
    }

    /// Write the loaded days back to the cache and append them to `points`.
    ///
    /// Cache writes are best-effort: failures are logged and otherwise
    /// ignored.
    pub async fn repopulate(
        &self,
        category: Category,
        fills: &BTreeMap<DateKey, DataPoint>,
        points: &mut Vec<(DateKey, DataPoint)>,
    ) {
        let writes = fills
            .iter()
            .map(|(&day, &point)| self.store_day(category, day, point));
        let failed = join_all(writes).await.into_iter().filter(|stored| !stored).count();

        if failed > 0 {
            warn!(%category, failed, total = fills.len(), "cache repopulation incomplete");
        }

        points.extend(fills.iter().map(|(&day, &point)| (day, point)));
    }

    async fn lookup_day(&self, category: Category, day: DateKey) -> DayLookup {
        let key = cache_key(category, day);

        let bytes = match self.with_deadline(self.cache.get(&key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return DayLookup::Absent,
            Err(e) => {
                let err = DomainError::CacheUnavailable(e.to_string());
                warn!(%key, error = %err, "cache lookup failed, treating as miss");
                return DayLookup::Degraded;
            }
        };

        match DataPoint::from_cache_value(&bytes) {
            Ok(point) => DayLookup::Hit(point),
            Err(e) => {
                let err = DomainError::MalformedCachedValue {
                    key: key.clone(),
                    reason: e.to_string(),
                };
                warn!(%key, error = %err, "treating undecodable cache entry as miss");
                DayLookup::Degraded
            }
        }
    }

    async fn store_day(&self, category: Category, day: DateKey, point: DataPoint) -> bool {
        let key = cache_key(category, day);

        let value = match point.to_cache_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "failed to encode point for cache");
                return false;
            }
        };

        match self
            .with_deadline(self.cache.set(&key, value, self.config.day_ttl))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(%key, error = %e, "cache write failed");
                false
            }
        }
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
