//! Model selection and invocation for Lumen.
//!
//! This crate turns a [`ModelProvider`] into something callers can hand a
//! prompt to and get text back:
//!
//! - [`ModelResolver`] discovers the provider's models, ranks them against a
//!   [`PriorityList`] and caches the winner for a fixed TTL.
//! - [`ResilientInvoker`] generates through the resolved model and, if that
//!   fails, retries once on a freshly discovered model that excludes the
//!   failed one.
//!
//! # Supported Providers
//!
//! - **Gemini**: Google's Generative Language API (API key required)
//! - **Mock**: Scripted provider for tests and offline use

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gemini;
pub mod invoker;
pub mod priority;
pub mod resolver;

use async_trait::async_trait;
use lumen_abstraction::{ModelError, ModelParameters, ModelProvider, ModelResponse, ModelUsage};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub use cache::{CacheConfig, CacheConfigError, CacheStats, CachedModel, ModelCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AiConfig, AiConfigError};
pub use error::{DiscoveryError, InvokeError, ResolveError};
pub use gemini::GeminiProvider;
pub use invoker::ResilientInvoker;
pub use priority::PriorityList;
pub use resolver::{ModelResolver, ModelSource, ResolvedModel};

/// A scripted implementation of [`ModelProvider`] for testing and demonstration.
///
/// Lists a fixed set of models and answers every generation request unless
/// a failure was registered for the listing or for a specific model.
#[derive(Debug)]
pub struct MockProvider {
    configured: bool,
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    models: Vec<String>,
    listing_error: Option<ModelError>,
    model_errors: HashMap<String, ModelError>,
    canned_response: Option<String>,
    list_calls: usize,
    generate_calls: Vec<String>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self { configured: true, state: Mutex::new(MockState::default()) }
    }
}

impl MockProvider {
    /// Creates a provider advertising `models`.
    #[must_use]
    pub fn with_models(models: &[&str]) -> Self {
        let provider = Self::default();
        provider.lock().models = models.iter().map(|m| (*m).to_string()).collect();
        provider
    }

    /// Marks the provider as missing its credential.
    #[must_use]
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Answers every successful generation with `text`.
    #[must_use]
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.lock().canned_response = Some(text.into());
        self
    }

    /// Makes every subsequent listing call fail with `error`.
    pub fn fail_listing(&self, error: ModelError) {
        self.lock().listing_error = Some(error);
    }

    /// Makes every subsequent generation with `model_id` fail with `error`.
    pub fn fail_model(&self, model_id: &str, error: ModelError) {
        self.lock().model_errors.insert(model_id.to_string(), error);
    }

    /// Number of listing calls made so far.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Model ids passed to each generation call, in order.
    pub fn generate_calls(&self) -> Vec<String> {
        self.lock().generate_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let mut state = self.lock();
        state.list_calls += 1;
        match state.listing_error {
            Some(ref err) => Err(err.clone()),
            None => Ok(state.models.clone()),
        }
    }

    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(model_id = %model_id, prompt_len = prompt.len(), parameters = ?parameters, "MockProvider generating text");

        let mut state = self.lock();
        state.generate_calls.push(model_id.to_string());
        if let Some(err) = state.model_errors.get(model_id) {
            return Err(err.clone());
        }

        let content = state
            .canned_response
            .clone()
            .unwrap_or_else(|| format!("Mock response for: {prompt}\nModel ID: {model_id}"));
        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(&content);

        Ok(ModelResponse {
            content,
            model_id: Some(model_id.to_string()),
            usage: Some(ModelUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }
}

/// Count tokens in a string (simplified: word count).
#[allow(clippy::cast_possible_truncation)]
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
