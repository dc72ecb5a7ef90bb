//! Provider abstraction layer for Lumen.
//!
//! This crate defines the narrow capability interface the AI layer needs from
//! a generative model backend: listing the models it advertises and
//! generating text with one of them. Everything above it (model selection,
//! caching, retries) is written against [`ModelProvider`] so it can be
//! exercised with fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when talking to a model provider.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The provider returned an error status or an unusable body.
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "gemini").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

/// Parameters for controlling the model's generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// What sampling temperature to use, between 0 and 2.
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass.
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sequences where the API will stop generating further tokens.
    pub stop_sequences: Option<Vec<String>>,

    /// Ask the provider for a JSON response body.
    #[serde(default)]
    pub json_response: bool,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(1.0),
            max_tokens: None,
            stop_sequences: None,
            json_response: false,
        }
    }
}

/// The response from a text generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated content.
    pub content: String,

    /// The ID of the model used to generate the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<ModelUsage>,
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// Capability interface of a generative model backend.
///
/// Implementations must be `Send + Sync` so a single provider can serve
/// concurrent requests.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider name used in logs and errors (e.g., "gemini").
    fn provider_name(&self) -> &str;

    /// Whether the provider holds the credential it needs to make calls.
    ///
    /// Callers check this before any network call so a missing credential
    /// surfaces as a configuration problem rather than a request failure.
    fn is_configured(&self) -> bool;

    /// Lists the identifiers of the generation-capable models the backend
    /// advertises, with any namespace prefix already removed.
    ///
    /// # Errors
    /// Returns a `ModelError` if the listing call fails or its body is unusable.
    async fn list_models(&self) -> Result<Vec<String>, ModelError>;

    /// Generates text with the given model.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_display_with_message() {
        let err = ModelError::QuotaExceeded {
            provider: "gemini".to_string(),
            message: Some("RESOURCE_EXHAUSTED".to_string()),
        };
        assert_eq!(err.to_string(), "Provider 'gemini' quota exceeded: RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_quota_exceeded_display_without_message() {
        let err = ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None };
        assert_eq!(err.to_string(), "Provider 'gemini' quota exceeded");
    }

    #[test]
    fn test_quota_exceeded_skips_empty_message_when_serialized() {
        let err = ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None };
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("message"));
    }

    #[test]
    fn test_model_parameters_default() {
        let params = ModelParameters::default();
        assert_eq!(params.temperature, Some(0.7));
        assert_eq!(params.top_p, Some(1.0));
        assert!(params.max_tokens.is_none());
        assert!(!params.json_response);
    }

    struct EchoProvider;

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn provider_name(&self) -> &str {
            "echo"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn list_models(&self) -> Result<Vec<String>, ModelError> {
            Ok(vec!["echo-1".to_string()])
        }

        async fn generate(
            &self,
            model_id: &str,
            prompt: &str,
            _parameters: Option<ModelParameters>,
        ) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                content: prompt.to_string(),
                model_id: Some(model_id.to_string()),
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn test_provider_is_object_safe() {
        let provider: Box<dyn ModelProvider> = Box::new(EchoProvider);
        let models = provider.list_models().await.unwrap();
        let response = provider.generate(&models[0], "hello", None).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(response.model_id.as_deref(), Some("echo-1"));
    }
}
