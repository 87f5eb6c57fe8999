//! CLI command implementations.

pub mod add;
pub mod clear_cache;
pub mod init;
pub mod list;
pub mod range;
pub mod serve;
