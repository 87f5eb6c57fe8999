use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

const ENV_PREFIX: &str = "GRAPHPOINT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid request_timeout_ms: {0}. Must be positive")]
    InvalidRequestTimeout(u64),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid cache backend: {0}. Must be one of: memory, redis, none")]
    InvalidCacheBackend(String),

    #[error("Cache backend '{0}' requires cache.url")]
    MissingCacheUrl(String),

    #[error("Invalid {field}: {value}. Must be positive")]
    InvalidTtl { field: &'static str, value: u64 },

    #[error("Invalid op_timeout_ms: {0}. Must be positive")]
    InvalidCacheTimeout(u64),

    #[error("Invalid max_range_days: {0}. Must be at least 1")]
    InvalidMaxRangeDays(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .graphpoint/config.yaml
    /// 3. .graphpoint/local.yaml (optional, for dev overrides)
    /// 4. Environment variables (GRAPHPOINT_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. Environment variables still
    /// override the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The layered provider stack used by [`ConfigLoader::load`].
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".graphpoint/config.yaml"))
            .merge(Yaml::file(".graphpoint/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        if config.server.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidRequestTimeout(config.server.request_timeout_ms));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let cache = &config.cache;
        match cache.backend.as_str() {
            "memory" | "none" => {}
            "redis" => {
                if cache.url.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::MissingCacheUrl(cache.backend.clone()));
                }
            }
            other => return Err(ConfigError::InvalidCacheBackend(other.to_string())),
        }

        if cache.day_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl {
                field: "day_ttl_secs",
                value: cache.day_ttl_secs,
            });
        }

        if cache.listing_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl {
                field: "listing_ttl_secs",
                value: cache.listing_ttl_secs,
            });
        }

        if cache.op_timeout_ms == 0 {
            return Err(ConfigError::InvalidCacheTimeout(cache.op_timeout_ms));
        }

        if config.query.max_range_days == 0 {
            return Err(ConfigError::InvalidMaxRangeDays(config.query.max_range_days));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
