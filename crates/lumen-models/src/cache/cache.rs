//! Single-slot cache holding the currently selected model.

use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use super::config::{CacheConfig, CacheConfigError};
use super::types::{CacheStats, CachedModel};

/// Cache of the selected model.
///
/// Holds at most one entry. Writes replace the whole entry; there is no
/// partial update. Concurrent writers race and the last one wins.
#[derive(Debug)]
pub struct ModelCache {
    /// The cached selection, if any.
    slot: RwLock<Option<CachedModel>>,
    /// Entry lifetime.
    ttl: chrono::Duration,
    /// Cache statistics.
    stats: RwLock<CacheStats>,
}

impl Default for ModelCache {
    /// An empty cache with the 12 hour default TTL.
    fn default() -> Self {
        Self::with_ttl(chrono::Duration::hours(12))
    }
}

impl ModelCache {
    fn with_ttl(ttl: chrono::Duration) -> Self {
        Self { slot: RwLock::new(None), ttl, stats: RwLock::new(CacheStats::default()) }
    }

    /// Create a new, empty model cache.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the configuration is invalid.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheConfigError> {
        Ok(Self::with_ttl(config.ttl()?))
    }

    /// Returns the cached model id if an entry exists and is fresh at `now`.
    ///
    /// Counts a hit or a miss.
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<String> {
        let hit = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.model_id.clone());

        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        if hit.is_some() {
            stats.total_hits += 1;
        } else {
            stats.total_misses += 1;
        }
        drop(stats);

        if let Some(ref model_id) = hit {
            debug!(model_id = %model_id, "Model cache hit");
        }
        hit
    }

    /// Replaces the cached entry with `model_id`, valid from `now` for the TTL.
    pub fn store(&self, model_id: &str, now: DateTime<Utc>) -> CachedModel {
        let entry = CachedModel::new(model_id.to_string(), now, self.ttl);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(entry.clone());
        self.stats.write().unwrap_or_else(PoisonError::into_inner).total_stores += 1;
        info!(model_id = %entry.model_id, expires_at = %entry.expires_at, "Cached selected model");
        entry
    }

    /// Returns a copy of the current entry, fresh or not, without touching stats.
    #[must_use]
    pub fn peek(&self) -> Option<CachedModel> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clears the cached entry.
    ///
    /// # Returns
    /// `true` if an entry was removed.
    pub fn invalidate(&self) -> bool {
        let removed = self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
        self.stats.write().unwrap_or_else(PoisonError::into_inner).total_invalidations += 1;
        if let Some(ref entry) = removed {
            info!(model_id = %entry.model_id, "Invalidated cached model");
        }
        removed.is_some()
    }

    /// Clears the cached entry only if it holds `model_id`.
    ///
    /// The comparison and the removal happen under one write lock, so an
    /// entry written concurrently for another model survives.
    pub fn invalidate_if(&self, model_id: &str) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_none_or(|entry| entry.model_id != model_id) {
            return false;
        }
        slot.take();
        drop(slot);

        self.stats.write().unwrap_or_else(PoisonError::into_inner).total_invalidations += 1;
        info!(model_id = %model_id, "Invalidated cached model");
        true
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}
