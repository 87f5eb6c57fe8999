//! Graph data repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Category, DataPoint, StoredPoint};

/// Repository interface for graph data persistence.
///
/// Dates cross this boundary in the store's long form
/// (`YYYY-MM-DD 00:00:00`). Any failure to issue or iterate a query is
/// reported as `DomainError::BackingStoreUnavailable`.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Select `(timestamp, x, y)` for `category` where the timestamp is one
    /// of `timestamps`. One round trip regardless of batch size.
    async fn find_by_dates(
        &self,
        category: Category,
        timestamps: &[String],
    ) -> DomainResult<Vec<StoredPoint>>;

    /// Whether a row already exists for `category` at `timestamp`.
    async fn exists(&self, category: Category, timestamp: &str) -> DomainResult<bool>;

    /// Insert one row.
    async fn insert(&self, category: Category, timestamp: &str, point: DataPoint) -> DomainResult<()>;

    /// All points of `category`, oldest first.
    async fn list(&self, category: Category) -> DomainResult<Vec<DataPoint>>;
}
