//! SQLite implementation of the GraphRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Category, DataPoint, StoredPoint};
use crate::domain::ports::GraphRepository;

#[derive(Clone)]
pub struct SqliteGraphRepository {
    pool: SqlitePool,
}

impl SqliteGraphRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl GraphRepository for SqliteGraphRepository {
    async fn find_by_dates(
        &self,
        category: Category,
        timestamps: &[String],
    ) -> DomainResult<Vec<StoredPoint>> {
        if timestamps.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no array binding, so the membership list is expanded
        // into one placeholder per date.
        let placeholders = vec!["?"; timestamps.len()].join(", ");
        let query = format!(
            "SELECT timestamp, x, y FROM graph_data WHERE graph_type = ? AND timestamp IN ({placeholders})"
        );

        let mut q = sqlx::query_as::<_, GraphRow>(&query).bind(category.as_str());
        for timestamp in timestamps {
            q = q.bind(timestamp);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(StoredPoint::from).collect())
    }

    async fn exists(&self, category: Category, timestamp: &str) -> DomainResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM graph_data WHERE graph_type = ? AND timestamp = ?)"
        )
        .bind(category.as_str())
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, category: Category, timestamp: &str, point: DataPoint) -> DomainResult<()> {
        sqlx::query("INSERT INTO graph_data (graph_type, timestamp, x, y) VALUES (?, ?, ?, ?)")
            .bind(category.as_str())
            .bind(timestamp)
            .bind(point.x)
            .bind(point.y)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => DomainError::DuplicatePoint {
                    category: category.as_str().to_string(),
                    date: timestamp.to_string(),
                },
                other => other.into(),
            })?;

        Ok(())
    }

    async fn list(&self, category: Category) -> DomainResult<Vec<DataPoint>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT x, y FROM graph_data WHERE graph_type = ? ORDER BY timestamp"
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(x, y)| DataPoint::new(x, y)).collect())
    }
}

#[derive(sqlx::FromRow)]
struct GraphRow {
    timestamp: String,
    x: i64,
    y: i64,
}

impl From<GraphRow> for StoredPoint {
    fn from(row: GraphRow) -> Self {
        Self {
            timestamp: row.timestamp,
            x: row.x,
            y: row.y,
        }
    }
}
