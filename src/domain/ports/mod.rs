//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - CacheStore: the key-value cache in front of the backing store
//! - GraphRepository: the durable graph data store

pub mod cache_store;
pub mod graph_repository;

pub use cache_store::{CacheError, CacheResult, CacheStore};
pub use graph_repository::GraphRepository;
