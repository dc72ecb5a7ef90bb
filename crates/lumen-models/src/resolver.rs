//! Model resolution: cached selection backed by dynamic discovery.

use lumen_abstraction::ModelProvider;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, CacheConfigError, CacheStats, CachedModel, ModelCache};
use crate::clock::{Clock, SystemClock};
use crate::error::{DiscoveryError, ResolveError};
use crate::priority::{DEFAULT_FALLBACK_MODEL, PriorityList};

/// Where a resolved model identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Served from a fresh cache entry.
    Cache,
    /// Selected from the provider's listing and cached.
    Discovered,
    /// Hardcoded fallback after a failed or empty discovery. Not cached.
    Fallback,
}

/// Result of a resolve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModel {
    /// The model identifier to generate with.
    pub model_id: String,
    /// How it was obtained.
    pub source: ModelSource,
}

/// Selects a working model for a provider and remembers the choice.
pub struct ModelResolver {
    provider: Arc<dyn ModelProvider>,
    cache: ModelCache,
    priority: PriorityList,
    fallback_model: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ModelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelResolver")
            .field("provider", &self.provider.provider_name())
            .field("cache", &self.cache)
            .field("priority", &self.priority)
            .field("fallback_model", &self.fallback_model)
            .field("clock", &self.clock)
            .finish()
    }
}

impl ModelResolver {
    /// Creates a resolver with the default priority list, a 12 hour cache and
    /// the system clock.
    #[must_use]
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            cache: ModelCache::default(),
            priority: PriorityList::default(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the cache configuration. Drops any cached entry.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the configuration is invalid.
    pub fn with_cache_config(mut self, config: &CacheConfig) -> Result<Self, CacheConfigError> {
        self.cache = ModelCache::new(config)?;
        Ok(self)
    }

    /// Replaces the priority list.
    #[must_use]
    pub fn with_priority(mut self, priority: PriorityList) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the ultimate fallback identifier.
    #[must_use]
    pub fn with_fallback_model(mut self, fallback_model: impl Into<String>) -> Self {
        self.fallback_model = fallback_model.into();
        self
    }

    /// Replaces the clock used for cache expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The provider models are resolved against.
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Returns a model identifier to generate with.
    ///
    /// With `force_refresh` unset and a fresh cache entry present, the entry
    /// is returned without contacting the provider. Otherwise the provider's
    /// listing is ranked, skipping anything in `excluded`; a selection is
    /// cached for the TTL. If discovery fails or finds nothing usable the
    /// fallback identifier is returned and the cache is left as it was.
    ///
    /// # Errors
    /// Returns `ResolveError::Configuration` when the provider has no
    /// credential. No network call is made in that case.
    pub async fn resolve(
        &self,
        force_refresh: bool,
        excluded: &HashSet<String>,
    ) -> Result<ResolvedModel, ResolveError> {
        self.ensure_configured()?;

        if !force_refresh {
            if let Some(model_id) = self.cache.get_fresh(self.clock.now()) {
                return Ok(ResolvedModel { model_id, source: ModelSource::Cache });
            }
        }

        match self.discover(excluded).await {
            Ok(model_id) => {
                self.cache.store(&model_id, self.clock.now());
                Ok(ResolvedModel { model_id, source: ModelSource::Discovered })
            }
            Err(err) => {
                // The fallback is not checked against the account; it may not exist for this key.
                warn!(
                    error = %err,
                    fallback = %self.fallback_model,
                    "Model discovery failed, using unverified fallback model"
                );
                Ok(ResolvedModel { model_id: self.fallback_model.clone(), source: ModelSource::Fallback })
            }
        }
    }

    /// Runs one discovery pass without touching the cache.
    async fn discover(&self, excluded: &HashSet<String>) -> Result<String, DiscoveryError> {
        let mut candidates = self.provider.list_models().await?;

        if !excluded.is_empty() {
            info!(excluded = ?excluded, "Excluding failed models from discovery");
            candidates.retain(|id| !excluded.contains(id));
        }
        debug!(candidates = ?candidates, "Candidate models");

        let selected = self
            .priority
            .select(&candidates)
            .ok_or(DiscoveryError::NoCandidates { available: candidates.len() })?;
        info!(model_id = %selected, "Selected best model");
        Ok(selected.to_string())
    }

    /// Fails with `ResolveError::Configuration` if the provider has no credential.
    pub fn ensure_configured(&self) -> Result<(), ResolveError> {
        if self.provider.is_configured() {
            return Ok(());
        }
        warn!(provider = %self.provider.provider_name(), "Model provider credential is not set");
        Err(ResolveError::Configuration(format!(
            "credential for provider '{}' is not set",
            self.provider.provider_name()
        )))
    }

    /// Lists the provider's candidates without ranking or caching.
    ///
    /// # Errors
    /// Returns `DiscoveryError::Listing` if the listing call fails.
    pub async fn list_candidates(&self) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.provider.list_models().await?)
    }

    /// Drops the cached selection so the next resolve rediscovers.
    pub fn invalidate(&self) -> bool {
        self.cache.invalidate()
    }

    /// Drops the cached selection if it is `model_id`.
    pub fn invalidate_if(&self, model_id: &str) -> bool {
        self.cache.invalidate_if(model_id)
    }

    /// The current cache entry, fresh or not.
    pub fn cached_model(&self) -> Option<CachedModel> {
        self.cache.peek()
    }

    /// Cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The priority list in use.
    pub fn priority(&self) -> &PriorityList {
        &self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use lumen_abstraction::ModelError;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()))
    }

    fn resolver(provider: &Arc<MockProvider>, clock: &Arc<ManualClock>) -> ModelResolver {
        ModelResolver::new(provider.clone()).with_clock(clock.clone())
    }

    #[tokio::test]
    async fn test_cache_hit_skips_discovery() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]));
        let clock = clock();
        let resolver = resolver(&provider, &clock);

        let first = resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(first.source, ModelSource::Discovered);

        clock.advance(Duration::hours(11));
        let second = resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(second, ResolvedModel { model_id: "gemini-2.5-flash".into(), source: ModelSource::Cache });
        assert_eq!(provider.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_rediscovers() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]));
        let clock = clock();
        let resolver = resolver(&provider, &clock);

        resolver.resolve(false, &HashSet::new()).await.unwrap();
        clock.advance(Duration::hours(13));
        let again = resolver.resolve(false, &HashSet::new()).await.unwrap();

        assert_eq!(again.source, ModelSource::Discovered);
        assert_eq!(provider.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_cache() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]));
        let clock = clock();
        let resolver = resolver(&provider, &clock);

        resolver.resolve(false, &HashSet::new()).await.unwrap();
        let forced = resolver.resolve(true, &HashSet::new()).await.unwrap();
        assert_eq!(forced.source, ModelSource::Discovered);
        assert_eq!(provider.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_excluded_model_skipped() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash", "gemini-1.5-flash"]));
        let resolver = resolver(&provider, &clock());

        let excluded = HashSet::from(["gemini-2.5-flash".to_string()]);
        let resolved = resolver.resolve(true, &excluded).await.unwrap();
        assert_eq!(resolved.model_id, "gemini-1.5-flash");
        assert_eq!(resolver.cached_model().unwrap().model_id, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_listing_failure_returns_uncached_fallback() {
        let provider = Arc::new(MockProvider::default());
        provider.fail_listing(ModelError::RequestError("connection refused".into()));
        let resolver = resolver(&provider, &clock());

        let resolved = resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(
            resolved,
            ResolvedModel { model_id: DEFAULT_FALLBACK_MODEL.into(), source: ModelSource::Fallback }
        );
        assert!(resolver.cached_model().is_none());

        // Not poisoned: the next resolve tries discovery again.
        resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(provider.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_rediscovery_keeps_previous_entry() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]));
        let resolver = resolver(&provider, &clock());
        resolver.resolve(false, &HashSet::new()).await.unwrap();

        provider.fail_listing(ModelError::RequestError("boom".into()));
        let forced = resolver.resolve(true, &HashSet::new()).await.unwrap();
        assert_eq!(forced.source, ModelSource::Fallback);
        assert_eq!(resolver.cached_model().unwrap().model_id, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_no_usable_candidate_returns_fallback() {
        let provider = Arc::new(MockProvider::with_models(&["text-bison-001", "embedding-gecko"]));
        let resolver = resolver(&provider, &clock()).with_fallback_model("gemini-custom");

        let resolved = resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(resolved.model_id, "gemini-custom");
        assert_eq!(resolved.source, ModelSource::Fallback);
        assert!(resolver.cached_model().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails_fast() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]).unconfigured());
        let resolver = resolver(&provider, &clock());

        let err = resolver.resolve(false, &HashSet::new()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Configuration(_)));
        assert_eq!(provider.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash"]));
        let clock = clock();
        let resolver = resolver(&provider, &clock)
            .with_cache_config(&CacheConfig::with_ttl_secs(60))
            .unwrap();

        resolver.resolve(false, &HashSet::new()).await.unwrap();
        clock.advance(Duration::seconds(61));
        resolver.resolve(false, &HashSet::new()).await.unwrap();
        assert_eq!(provider.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_list_candidates_does_not_cache() {
        let provider = Arc::new(MockProvider::with_models(&["gemini-2.5-flash", "gemini-1.5-pro"]));
        let resolver = resolver(&provider, &clock());

        let listed = resolver.list_candidates().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(resolver.cached_model().is_none());
    }
}
