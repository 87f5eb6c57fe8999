//! Pool setup for the graph data store.
//!
//! Production pools open the file named by [`DatabaseConfig`]; tests get a
//! private in-memory database per pool.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

/// Wait for a free pooled connection before giving up on a request.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to open database {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to create database directory {path}: {source}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Database did not answer: {0}")]
    Unresponsive(#[source] sqlx::Error),
}

/// Open the database file named by `config`, creating it and its parent
/// directory when missing.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, ConnectionError> {
    let path = Path::new(&config.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConnectionError::DirectoryCreationFailed {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout());

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::OpenFailed {
            path: config.path.clone(),
            source,
        })
}

/// Single-connection in-memory pool; every call gets a fresh database.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let open_failed = |source| ConnectionError::OpenFailed {
        path: ":memory:".to_string(),
        source,
    };
    let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(open_failed)?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(open_failed)
}

pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(ConnectionError::Unresponsive)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_on_file_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("graph.db");
        let config = DatabaseConfig {
            path: db_path.display().to_string(),
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await.unwrap();
        verify_connection(&pool).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pool_honors_busy_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("graph.db").display().to_string(),
            busy_timeout_ms: 1234,
            ..DatabaseConfig::default()
        };

        let pool = create_pool(&config).await.unwrap();
        let timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout").fetch_one(&pool).await.unwrap();
        assert_eq!(timeout, 1234);
    }

    #[tokio::test]
    async fn test_open_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a database file
        let config = DatabaseConfig {
            path: dir.path().display().to_string(),
            ..DatabaseConfig::default()
        };

        let err = create_pool(&config).await.unwrap_err();
        assert!(matches!(err, ConnectionError::OpenFailed { .. }));
        assert!(err.to_string().contains(&config.path));
    }

    #[tokio::test]
    async fn test_memory_pool() {
        let pool = create_test_pool().await.unwrap();
        verify_connection(&pool).await.unwrap();
    }
}
