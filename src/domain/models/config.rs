use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for graphpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cache store configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Range query limits
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to add permissive CORS headers
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Upper bound on the handling time of one request, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Capacity of the live update broadcast channel
    #[serde(default = "default_live_update_capacity")]
    pub live_update_capacity: usize,

    /// SSE keep-alive interval, in milliseconds
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_live_update_capacity() -> usize {
    256
}

const fn default_heartbeat_interval_ms() -> u64 {
    30000
}

impl ServerConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
            request_timeout_ms: default_request_timeout_ms(),
            live_update_capacity: default_live_update_capacity(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> String {
    ".graphpoint/graphpoint.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

impl DatabaseConfig {
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Backend: memory or redis
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Connection URL, required for the redis backend
    #[serde(default)]
    pub url: Option<String>,

    /// TTL of per-day entries written by range queries, in seconds
    #[serde(default = "default_day_ttl_secs")]
    pub day_ttl_secs: u64,

    /// TTL of full-series listings, in seconds
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,

    /// Timeout applied to every single cache operation, in milliseconds
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Maximum number of entries held by the in-process backend
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

const fn default_day_ttl_secs() -> u64 {
    60 * 60
}

const fn default_listing_ttl_secs() -> u64 {
    10 * 60
}

const fn default_op_timeout_ms() -> u64 {
    500
}

const fn default_max_capacity() -> u64 {
    100_000
}

impl CacheConfig {
    pub const fn day_ttl(&self) -> Duration {
        Duration::from_secs(self.day_ttl_secs)
    }

    pub const fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub const fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            url: None,
            day_ttl_secs: default_day_ttl_secs(),
            listing_ttl_secs: default_listing_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
            max_capacity: default_max_capacity(),
        }
    }
}

/// Range query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryConfig {
    /// Longest accepted range, in days (bounds included)
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

const fn default_max_range_days() -> u32 {
    366
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
