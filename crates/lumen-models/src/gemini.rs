//! Google Gemini provider.
//!
//! Implements [`ModelProvider`] against the Generative Language REST API:
//! `GET /models` for discovery and `POST /models/{id}:generateContent` for
//! generation. The API key travels as the `key` query parameter.

use async_trait::async_trait;
use lumen_abstraction::{ModelError, ModelParameters, ModelProvider, ModelResponse, ModelUsage};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, warn};

/// Default endpoint of the Generative Language API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const MODEL_NAME_PREFIX: &str = "models/";
const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Google Gemini provider.
#[derive(Clone)]
pub struct GeminiProvider {
    /// The API key, if configured.
    api_key: Option<String>,
    /// The base URL for the Gemini API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Creates a provider reading the API key from `GEMINI_API_KEY`.
    ///
    /// A missing or empty variable leaves the provider unconfigured; the
    /// resolver reports that as a configuration error on first use.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = env::var(GEMINI_API_KEY_ENV).ok();
        Self::new(api_key)
    }

    /// Creates a provider with an explicit (possibly absent) API key.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Overrides the API base URL (used for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The base URL in use.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, ModelError> {
        self.api_key.as_deref().ok_or_else(|| {
            ModelError::Other(format!("{GEMINI_API_KEY_ENV} environment variable not set"))
        })
    }

    /// Maps a non-success status to a `ModelError`.
    fn status_error(status: StatusCode, body: String) -> ModelError {
        if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::TOO_MANY_REQUESTS {
            return ModelError::QuotaExceeded { provider: "gemini".to_string(), message: Some(body) };
        }
        ModelError::ModelResponseError(format!("API error ({}): {}", status, body))
    }
}

/// Strips the `models/` namespace from a listed model name.
pub fn strip_model_prefix(name: &str) -> &str {
    name.strip_prefix(MODEL_NAME_PREFIX).unwrap_or(name)
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models", self.base_url);
        debug!(url = %url, "Listing Gemini models");

        let response =
            self.client.get(&url).query(&[("key", api_key)]).send().await.map_err(|e| {
                error!(error = %e, "Failed to send model listing request");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, error = %error_text, "Gemini model listing returned error status");
            return Err(Self::status_error(status, error_text));
        }

        let listing: GeminiModelList = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini model listing");
            ModelError::SerializationError(format!("Failed to parse model listing: {}", e))
        })?;

        Ok(listing
            .models
            .into_iter()
            .filter(GeminiModelDescriptor::supports_generation)
            .map(|m| strip_model_prefix(&m.name).to_string())
            .collect())
    }

    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        let api_key = self.api_key()?;
        debug!(
            model_id = %model_id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "GeminiProvider generating text"
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, model_id);
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: Some(prompt.to_string()) }],
            }],
            generation_config: parameters.map(GeminiGenerationConfig::from),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Gemini API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                model_id = %model_id,
                "Gemini API returned error status"
            );
            return Err(Self::status_error(status, error_text));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let content = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                error!(model_id = %model_id, "No content in Gemini API response");
                ModelError::ModelResponseError("No content in API response".to_string())
            })?;

        let usage = gemini_response.usage_metadata.map(|meta| ModelUsage {
            prompt_tokens: meta.prompt_token_count.unwrap_or(0),
            completion_tokens: meta.candidates_token_count.unwrap_or(0),
            total_tokens: meta.total_token_count.unwrap_or(0),
        });

        Ok(ModelResponse { content, model_id: Some(model_id.to_string()), usage })
    }
}

// Gemini API request/response structures

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModelDescriptor>,
}

#[derive(Debug, Deserialize)]
struct GeminiModelDescriptor {
    name: String,
    #[serde(rename = "supportedGenerationMethods")]
    supported_generation_methods: Option<Vec<String>>,
}

impl GeminiModelDescriptor {
    /// Descriptors without a method list are assumed to support generation.
    fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .as_ref()
            .is_none_or(|methods| methods.iter().any(|m| m == GENERATE_CONTENT_METHOD))
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "stopSequences", skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

impl From<ModelParameters> for GeminiGenerationConfig {
    fn from(params: ModelParameters) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            max_output_tokens: params.max_tokens,
            stop_sequences: params.stop_sequences,
            response_mime_type: params.json_response.then(|| "application/json".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn provider(server: &Server) -> GeminiProvider {
        GeminiProvider::new(Some("test-key".to_string())).with_base_url(server.url())
    }

    #[test]
    fn test_strip_model_prefix() {
        assert_eq!(strip_model_prefix("models/gemini-2.5-flash"), "gemini-2.5-flash");
        assert_eq!(strip_model_prefix("gemini-2.5-flash"), "gemini-2.5-flash");
    }

    #[test]
    fn test_empty_api_key_is_unconfigured() {
        assert!(!GeminiProvider::new(Some("  ".to_string())).is_configured());
        assert!(!GeminiProvider::new(None).is_configured());
        assert!(GeminiProvider::new(Some("abc".to_string())).is_configured());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = GeminiProvider::new(Some("super-secret".to_string()));
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = GeminiProvider::new(None).with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(provider.base_url(), "http://localhost:9000/v1beta");
    }

    #[test]
    fn test_generation_config_serialization() {
        let params = ModelParameters { json_response: true, max_tokens: Some(256), ..Default::default() };
        let json = serde_json::to_value(GeminiGenerationConfig::from(params)).unwrap();
        assert_eq!(json["responseMimeType"], "application/json");
        assert_eq!(json["maxOutputTokens"], 256);
        assert!(json.get("stopSequences").is_none());
    }

    #[tokio::test]
    async fn test_list_models_strips_prefix_and_filters_methods() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/models")
            .match_query(Matcher::UrlEncoded("key".to_string(), "test-key".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "models": [
                        {"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                        {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                        {"name": "models/gemini-1.5-pro"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let models = provider(&server).list_models().await.unwrap();
        assert_eq!(models, vec!["gemini-2.5-flash".to_string(), "gemini-1.5-pro".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_models_empty_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        assert!(provider(&server).list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_models_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let err = provider(&server).list_models().await.unwrap_err();
        assert!(matches!(err, ModelError::ModelResponseError(ref msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_list_models_without_key_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", "/models").match_query(Matcher::Any).expect(0).create_async().await;

        let provider = GeminiProvider::new(None).with_base_url(server.url());
        assert!(provider.list_models().await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".to_string(), "test-key".to_string()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Say hello"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world!"}]}}],
                    "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
                }"#,
            )
            .create_async()
            .await;

        let response = provider(&server).generate("gemini-2.5-flash", "Say hello", None).await.unwrap();
        assert_eq!(response.content, "Hello, world!");
        assert_eq!(response.model_id.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(
            response.usage,
            Some(ModelUsage { prompt_tokens: 3, completion_tokens: 4, total_tokens: 7 })
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_quota_exceeded() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let err = provider(&server).generate("gemini-2.5-flash", "hi", None).await.unwrap_err();
        assert!(matches!(err, ModelError::QuotaExceeded { ref provider, .. } if provider == "gemini"));
    }

    #[tokio::test]
    async fn test_generate_no_candidates_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = provider(&server).generate("gemini-2.5-flash", "hi", None).await.unwrap_err();
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = provider(&server).generate("gemini-2.5-flash", "hi", None).await.unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(_)));
    }
}
