//! Graph data point domain model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Graph type a series of points belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Line,
    Bar,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
        }
    }

    /// Exact match only: `"Line"` is not a valid graph type.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            _ => None,
        }
    }

    /// Like [`Category::from_str`] but returns `InvalidCategory` on failure.
    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::from_str(s).ok_or_else(|| DomainError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement for one category on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: i64,
    pub y: i64,
}

impl DataPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// JSON encoding stored as the cache value.
    pub fn to_cache_value(&self) -> DomainResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_cache_value(bytes: &[u8]) -> DomainResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A raw row from the backing store. `timestamp` is the store's long form
/// and has not been validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPoint {
    pub timestamp: String,
    pub x: i64,
    pub y: i64,
}

impl StoredPoint {
    pub fn point(&self) -> DataPoint {
        DataPoint::new(self.x, self.y)
    }
}

/// Live-update payload published when a point is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    pub x: i64,
    pub y: i64,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub graph_type: Category,
}
