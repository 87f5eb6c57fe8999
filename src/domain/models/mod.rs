pub mod config;
pub mod data_point;
pub mod date_key;

pub use config::{
    CacheConfig, Config, DatabaseConfig, LoggingConfig, QueryConfig, ServerConfig,
};
pub use data_point::{Category, DataPoint, PointEvent, StoredPoint};
pub use date_key::{cache_key, DateKey, DateRange, BACKING_LAYOUT, SHORT_LAYOUT};
