//! AI layer configuration.
//!
//! Configuration precedence, highest first:
//! 1. Environment variables (`GEMINI_API_KEY`, `LUMEN_*`)
//! 2. Local config file (./.lumenrc)
//! 3. Global config file (~/.lumen/config.toml)
//! 4. Defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheConfig, CacheConfigError};
use crate::gemini::{GEMINI_API_KEY_ENV, GeminiProvider};
use crate::invoker::ResilientInvoker;
use crate::priority::PriorityList;
use crate::resolver::ModelResolver;

/// Overrides the Gemini API base URL.
pub const BASE_URL_ENV: &str = "LUMEN_GEMINI_BASE_URL";
/// Overrides the cache TTL in seconds.
pub const CACHE_TTL_ENV: &str = "LUMEN_MODEL_CACHE_TTL_SECS";
/// Overrides the ultimate fallback model.
pub const FALLBACK_MODEL_ENV: &str = "LUMEN_FALLBACK_MODEL";

/// AI layer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key. Prefer the `GEMINI_API_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Gemini API base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model priority substrings, most preferred first.
    #[serde(default)]
    pub priority: Option<Vec<String>>,

    /// Model used when discovery finds nothing.
    #[serde(default)]
    pub fallback_model: Option<String>,

    /// Selected-model cache settings.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum AiConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read or write a configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Invalid cache settings.
    #[error(transparent)]
    Cache(#[from] CacheConfigError),
}

/// Result type for configuration operations.
pub type AiConfigResult<T> = std::result::Result<T, AiConfigError>;

impl AiConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> AiConfigResult<Self> {
        if !path.exists() {
            return Err(AiConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AiConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| AiConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file. The API key is never written.
    pub fn save_to_file(&self, path: &Path) -> AiConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AiConfigError::ParseError(format!("Failed to serialize: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AiConfigError::ReadError(format!("Failed to create directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| AiConfigError::ReadError(format!("Failed to write file: {}", e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".lumen")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".lumenrc")
    }

    /// Discover and load configuration files, then apply environment overrides.
    ///
    /// Missing files are skipped. A file that exists but fails to parse is an error.
    pub fn discover_and_load() -> AiConfigResult<Self> {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(file_config) => config.merge(file_config),
                Err(AiConfigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: Self) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.priority.is_some() {
            self.priority = other.priority;
        }
        if other.fallback_model.is_some() {
            self.fallback_model = other.fallback_model;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> AiConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(GEMINI_API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        if let Some(model) = get(FALLBACK_MODEL_ENV) {
            self.fallback_model = Some(model);
        }
        if let Some(ttl) = get(CACHE_TTL_ENV) {
            let ttl_secs = ttl.trim().parse().map_err(|_| {
                AiConfigError::InvalidValue(format!("{CACHE_TTL_ENV} must be a number of seconds, got '{ttl}'"))
            })?;
            self.cache.get_or_insert_with(CacheConfig::default).ttl_secs = ttl_secs;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AiConfigResult<()> {
        self.cache_config().validate()?;

        if let Some(ref priority) = self.priority {
            if priority.iter().any(|entry| entry.trim().is_empty()) {
                return Err(AiConfigError::InvalidValue(
                    "priority entries must not be empty".to_string(),
                ));
            }
        }
        if self.fallback_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(AiConfigError::InvalidValue("fallback_model must not be empty".to_string()));
        }
        if let Some(ref url) = self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AiConfigError::InvalidValue(format!(
                    "base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    /// The cache settings in effect, defaults when none were given.
    pub fn cache_config(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    /// Builds the Gemini provider described by this configuration.
    pub fn build_provider(&self) -> GeminiProvider {
        let provider = GeminiProvider::new(self.api_key.clone());
        match self.base_url {
            Some(ref url) => provider.with_base_url(url.clone()),
            None => provider,
        }
    }

    /// Builds a resolver around the Gemini provider.
    pub fn build_resolver(&self) -> AiConfigResult<ModelResolver> {
        self.validate()?;

        let mut resolver =
            ModelResolver::new(Arc::new(self.build_provider())).with_cache_config(&self.cache_config())?;
        if let Some(ref priority) = self.priority {
            resolver = resolver.with_priority(PriorityList::new(priority.clone()));
        }
        if let Some(ref fallback) = self.fallback_model {
            resolver = resolver.with_fallback_model(fallback.clone());
        }
        Ok(resolver)
    }

    /// Builds a resilient invoker around the Gemini provider.
    pub fn build_invoker(&self) -> AiConfigResult<ResilientInvoker> {
        Ok(ResilientInvoker::new(Arc::new(self.build_resolver()?)))
    }
}
