//! Core data types for the selected-model cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The cached model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedModel {
    /// The selected model identifier.
    pub model_id: String,
    /// When the selection was made.
    pub cached_at: DateTime<Utc>,
    /// When the selection stops being served from cache.
    pub expires_at: DateTime<Utc>,
}

impl CachedModel {
    /// Create a new cache entry valid for `ttl` starting at `now`.
    ///
    /// An expiry past the representable range saturates at the latest instant.
    pub fn new(model_id: String, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { model_id, cached_at: now, expires_at }
    }

    /// Whether the entry is still valid at `now`.
    ///
    /// An entry is stale at exactly its expiry instant.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Cache statistics for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Resolves served from the cache.
    pub total_hits: u64,
    /// Resolves that found no fresh entry.
    pub total_misses: u64,
    /// Times a discovered model was written to the cache.
    pub total_stores: u64,
    /// Times the cache was explicitly invalidated.
    pub total_invalidations: u64,
}
