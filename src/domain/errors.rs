//! Domain errors for the graphpoint service.

use thiserror::Error;

/// Domain-level errors that can occur in the graphpoint system.
///
/// Only `BackingStoreUnavailable` and `DeadlineExceeded` ever escape a range
/// query; cache-side failures are absorbed by the orchestrator and degrade to
/// misses.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid graph type: {0}. Must be one of: line, bar")]
    InvalidCategory(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Malformed date: {0}")]
    MalformedDate(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Malformed cached value for {key}: {reason}")]
    MalformedCachedValue { key: String, reason: String },

    #[error("Backing store unavailable: {0}")]
    BackingStoreUnavailable(String),

    #[error("Data for {category} on {date} already exists")]
    DuplicatePoint { category: String, date: String },

    #[error("Request deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the error was caused by the caller's input.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCategory(_)
                | Self::InvalidDateRange(_)
                | Self::MalformedDate(_)
                | Self::DuplicatePoint { .. }
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::BackingStoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
