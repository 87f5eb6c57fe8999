//! graphpoint - cache-aside range queries over daily graph data
//!
//! Each graph (`line`, `bar`) holds at most one `(x, y)` point per calendar
//! day. A range query looks up every day in the cache concurrently, loads
//! the missing days from SQLite in one batch and writes them back with a
//! TTL.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): range query orchestration, insert path, live updates
//! - **Adapters** (`adapters`): cache backends, SQLite store, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::{Category, Config, DataPoint, DateKey, DateRange};
pub use domain::ports::{CacheStore, GraphRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PointService, RangeQueryService};
