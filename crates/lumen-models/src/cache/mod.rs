//! Selected-model cache.
//!
//! Keeps the result of the last successful model discovery for a fixed TTL
//! so most generation requests skip the listing call entirely.

#[allow(clippy::module_inception)]
pub mod cache;
pub mod config;
pub mod types;

pub use cache::ModelCache;
pub use config::{CacheConfig, CacheConfigError, MAX_TTL_SECS};
pub use types::{CacheStats, CachedModel};
