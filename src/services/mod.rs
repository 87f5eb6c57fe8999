//! Application services built on the domain ports.

pub mod live_updates;
pub mod point_service;
pub mod range_query;

pub use live_updates::{LiveUpdate, LiveUpdateBus, LiveUpdateConfig};
pub use point_service::{listing_key, PointService, PointServiceConfig};
pub use range_query::{RangeFetch, RangeQueryConfig, RangeQueryService};
