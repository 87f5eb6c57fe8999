//! Infrastructure layer module
//!
//! - Configuration management
//! - Logging infrastructure
//! - Application wiring
//!
//! Adapters satisfying the domain ports live in `crate::adapters`.

pub mod config;
pub mod logging;
pub mod setup;

pub use setup::AppContext;
