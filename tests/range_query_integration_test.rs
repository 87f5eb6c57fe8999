//! End-to-end range queries over the SQLite store and cache doubles.

mod common;

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{
    as_cache, day, seeded_repository, CountingRepository, FailingCache, RecordingCache,
    StallingCache,
};
use graphpoint::adapters::cache::MokaCacheStore;
use graphpoint::adapters::sqlite::SqliteGraphRepository;
use graphpoint::domain::models::{cache_key, Category, DataPoint, DateKey, DateRange};
use graphpoint::domain::ports::CacheStore;
use graphpoint::domain::DomainError;
use graphpoint::services::{RangeQueryConfig, RangeQueryService};

type Repo = CountingRepository<SqliteGraphRepository>;

async fn march_store() -> Arc<Repo> {
    Arc::new(CountingRepository::new(
        seeded_repository(&[
            (Category::Line, "2024-03-01 00:00:00", 1, 2),
            (Category::Line, "2024-03-03 00:00:00", 5, 9),
            (Category::Bar, "2024-03-02 00:00:00", 4, 4),
        ])
        .await,
    ))
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end, 366).unwrap()
}

#[tokio::test]
async fn test_cold_cache_scenario() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Line, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap();

    assert_eq!(points, vec![DataPoint::new(1, 2), DataPoint::new(5, 9)]);
    assert_eq!(cache.written_keys(), vec!["line2024-03-01", "line2024-03-03"]);
    assert!(cache
        .writes()
        .iter()
        .all(|(_, ttl)| *ttl == Duration::from_secs(60 * 60)));
    assert_eq!(cache.point("line2024-03-03").await, Some(DataPoint::new(5, 9)));

    // one batch covering all three days
    assert_eq!(
        repo.batches(),
        vec![vec![
            "2024-03-01 00:00:00".to_string(),
            "2024-03-02 00:00:00".to_string(),
            "2024-03-03 00:00:00".to_string(),
        ]]
    );
}

#[tokio::test]
async fn test_second_query_reads_only_unfilled_days() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());
    let march = range("2024-03-01", "2024-03-03");

    let first = service.query(Category::Line, &march).await.unwrap();
    cache.clear_writes();
    let second = service.query(Category::Line, &march).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(repo.batch_count(), 2);
    assert_eq!(repo.batches()[1], vec!["2024-03-02 00:00:00".to_string()]);
    assert!(cache.writes().is_empty());
}

#[tokio::test]
async fn test_all_hits_never_reach_store() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    for (d, x) in [(1, 10), (2, 20), (3, 30)] {
        cache
            .seed(&cache_key(Category::Bar, day(2024, 3, d)), DataPoint::new(x, 0))
            .await;
    }
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Bar, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap();

    assert_eq!(
        points,
        vec![DataPoint::new(10, 0), DataPoint::new(20, 0), DataPoint::new(30, 0)]
    );
    assert_eq!(repo.batch_count(), 0);
    assert_eq!(cache.get_count(), 3);
}

#[tokio::test]
async fn test_unavailable_cache_serves_store_rows() {
    let repo = march_store().await;
    let cache = Arc::new(FailingCache::default());
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Line, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap();

    assert_eq!(points, vec![DataPoint::new(1, 2), DataPoint::new(5, 9)]);
    // three failed reads, two failed writes
    assert_eq!(cache.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_stalled_cache_degrades_after_op_timeout() {
    let repo = march_store().await;
    let cache = Arc::new(StallingCache::default());
    let config = RangeQueryConfig {
        cache_op_timeout: Duration::from_millis(20),
        ..RangeQueryConfig::default()
    };
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), config);

    let points = tokio::time::timeout(
        Duration::from_secs(5),
        service.query(Category::Line, &range("2024-03-01", "2024-03-03")),
    )
    .await
    .expect("per-call timeouts bound the query")
    .unwrap();

    assert_eq!(points, vec![DataPoint::new(1, 2), DataPoint::new(5, 9)]);
    assert_eq!(cache.finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dropping_query_cancels_in_flight_lookups() {
    let repo = march_store().await;
    let cache = Arc::new(StallingCache::default());
    let config = RangeQueryConfig {
        cache_op_timeout: Duration::from_secs(60),
        ..RangeQueryConfig::default()
    };
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), config);

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        service.query(Category::Line, &range("2024-03-01", "2024-03-10")),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(cache.started.load(Ordering::SeqCst), 10);
    assert_eq!(cache.finished.load(Ordering::SeqCst), 0);
    assert_eq!(repo.batch_count(), 0);
}

#[tokio::test]
async fn test_malformed_cached_value_is_replaced() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    cache.seed_raw("line2024-03-01", b"not json").await;
    cache.seed("line2024-03-03", DataPoint::new(5, 9)).await;
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Line, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap();

    assert_eq!(points, vec![DataPoint::new(1, 2), DataPoint::new(5, 9)]);
    assert_eq!(cache.written_keys(), vec!["line2024-03-01"]);
    assert_eq!(cache.point("line2024-03-01").await, Some(DataPoint::new(1, 2)));
}

#[tokio::test]
async fn test_range_across_year_boundary() {
    let repo = Arc::new(CountingRepository::new(
        seeded_repository(&[
            (Category::Bar, "2023-12-31 00:00:00", 31, 12),
            (Category::Bar, "2024-01-01 00:00:00", 1, 1),
            (Category::Bar, "2024-01-03 00:00:00", 3, 1),
        ])
        .await,
    ));
    let cache = Arc::new(MokaCacheStore::new());
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Bar, &range("2023-12-30", "2024-01-02"))
        .await
        .unwrap();

    assert_eq!(points, vec![DataPoint::new(31, 12), DataPoint::new(1, 1)]);
    assert_eq!(repo.batches()[0].len(), 4);
    assert!(cache.get("bar2023-12-31").await.unwrap().is_some());
    assert!(cache.get("bar2024-01-03").await.unwrap().is_none());
}

#[tokio::test]
async fn test_results_are_date_ordered_with_mixed_hits() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    // hits are collected before fills, so sorting has work to do
    cache.seed("line2024-03-02", DataPoint::new(3, 3)).await;
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let points = service
        .query(Category::Line, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap();

    assert_eq!(
        points,
        vec![DataPoint::new(1, 2), DataPoint::new(3, 3), DataPoint::new(5, 9)]
    );
}

#[tokio::test]
async fn test_backing_store_failure_fails_query() {
    let repo = march_store().await;
    repo.inner().pool().close().await;
    let cache = Arc::new(RecordingCache::default());
    cache.seed("line2024-03-01", DataPoint::new(1, 2)).await;
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());

    let err = service
        .query(Category::Line, &range("2024-03-01", "2024-03-03"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::BackingStoreUnavailable(_)));
    assert!(cache.writes().is_empty());
}

#[tokio::test]
async fn test_categories_do_not_share_entries() {
    let repo = march_store().await;
    let cache = Arc::new(RecordingCache::default());
    let service = RangeQueryService::new(as_cache(&cache), repo.clone(), RangeQueryConfig::default());
    let march = range("2024-03-01", "2024-03-03");

    service.query(Category::Line, &march).await.unwrap();
    let bars = service.query(Category::Bar, &march).await.unwrap();

    assert_eq!(bars, vec![DataPoint::new(4, 4)]);
    assert_eq!(
        cache.written_keys(),
        vec!["bar2024-03-02", "line2024-03-01", "line2024-03-03"]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_day_is_a_hit_or_a_miss(
        offset in 0i64..3000,
        len in 1u32..90,
        cached in proptest::collection::vec(any::<bool>(), 90),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let start = day(2018, 1, 1).date() + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(i64::from(len) - 1);
            let range = DateRange::new(DateKey::new(start), DateKey::new(end), 366).unwrap();

            let cache = Arc::new(MokaCacheStore::new());
            let mut expected_hits = BTreeSet::new();
            for (day, is_cached) in range.days().zip(&cached) {
                if *is_cached {
                    cache
                        .set(
                            &cache_key(Category::Line, day),
                            DataPoint::new(1, 1).to_cache_value().unwrap(),
                            Duration::from_secs(60),
                        )
                        .await
                        .unwrap();
                    expected_hits.insert(day);
                }
            }

            let repo = Arc::new(seeded_repository(&[]).await);
            let service = RangeQueryService::new(as_cache(&cache), repo, RangeQueryConfig::default());
            let fetch = service.fetch_range(Category::Line, &range).await;

            let hits: BTreeSet<_> = fetch.points.iter().map(|(day, _)| *day).collect();
            let all: BTreeSet<_> = range.days().collect();

            prop_assert_eq!(all.len() as u64, range.len_days());
            prop_assert_eq!(&hits, &expected_hits);
            prop_assert!(hits.is_disjoint(&fetch.misses));
            prop_assert_eq!(hits.union(&fetch.misses).copied().collect::<BTreeSet<_>>(), all);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
