//! Configuration for the selected-model cache.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the model cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Seconds a discovered model stays selected (default: 43200 = 12 hours).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    12 * 60 * 60
}

/// Longest accepted TTL: one year.
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Errors that can occur during cache configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    /// Invalid TTL (must be > 0).
    #[error("Invalid cache TTL: must be greater than 0")]
    InvalidTtl,

    /// TTL exceeds [`MAX_TTL_SECS`].
    #[error("Invalid cache TTL: {0} seconds is out of range (max {MAX_TTL_SECS})")]
    TtlOutOfRange(u64),
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: default_ttl_secs() }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given TTL in seconds.
    #[must_use]
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self { ttl_secs }
    }

    /// Validate the cache configuration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        self.ttl().map(|_| ())
    }

    /// Get the TTL as a chrono Duration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the TTL is zero or too large.
    pub fn ttl(&self) -> Result<chrono::Duration, CacheConfigError> {
        if self.ttl_secs == 0 {
            return Err(CacheConfigError::InvalidTtl);
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(CacheConfigError::TtlOutOfRange(self.ttl_secs));
        }
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or(CacheConfigError::TtlOutOfRange(self.ttl_secs))
    }
}
