//! Generation with one recovery attempt.
//!
//! Each call makes at most two attempts. The first uses whatever the resolver
//! returns (normally the cached model). If generation fails, a cache entry
//! naming the failed model is dropped, the resolver is forced to rediscover
//! with that model excluded, and the prompt is sent once more. A second
//! failure is terminal.

use lumen_abstraction::{ModelParameters, ModelResponse};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::InvokeError;
use crate::resolver::ModelResolver;

/// Upper bound on generation attempts per call.
pub const MAX_ATTEMPTS: u8 = 2;

/// Generates text through a [`ModelResolver`], recovering once from a failing model.
#[derive(Debug, Clone)]
pub struct ResilientInvoker {
    resolver: Arc<ModelResolver>,
}

impl ResilientInvoker {
    /// Creates an invoker sharing `resolver` (and its cache) with other callers.
    #[must_use]
    pub fn new(resolver: Arc<ModelResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver backing this invoker.
    pub fn resolver(&self) -> &Arc<ModelResolver> {
        &self.resolver
    }

    /// Generates text for `prompt` and returns it.
    ///
    /// # Errors
    /// Returns `InvokeError::Configuration` if the provider credential is
    /// missing, or `InvokeError::Generation` if both attempts fail.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, InvokeError> {
        self.generate(prompt, None).await.map(|response| response.content)
    }

    /// Generates a full response for `prompt` with optional parameters.
    ///
    /// # Errors
    /// Returns `InvokeError::Configuration` if the provider credential is
    /// missing, or `InvokeError::Generation` if both attempts fail.
    pub async fn generate(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, InvokeError> {
        let provider = self.resolver.provider();

        let first = self.resolver.resolve(false, &HashSet::new()).await?;
        let first_error =
            match provider.generate(&first.model_id, prompt, parameters.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

        warn!(
            model_id = %first.model_id,
            source = ?first.source,
            error = %first_error,
            "Generation failed, retrying with an alternative model"
        );

        self.resolver.invalidate_if(&first.model_id);

        let excluded = HashSet::from([first.model_id.clone()]);
        let retry = self.resolver.resolve(true, &excluded).await?;
        info!(failed = %first.model_id, model_id = %retry.model_id, "Retrying generation");

        provider.generate(&retry.model_id, prompt, parameters).await.map_err(|source| {
            error!(model_id = %retry.model_id, error = %source, "Retry failed");
            InvokeError::Generation { model_id: retry.model_id, attempts: MAX_ATTEMPTS, source }
        })
    }
}
