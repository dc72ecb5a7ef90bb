//! Error types for model resolution and invocation.

use lumen_abstraction::ModelError;
use thiserror::Error;

/// Errors returned by [`crate::ModelResolver::resolve`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A required credential or setting is missing. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Reasons a discovery pass produced no selection.
///
/// Discovery errors never reach callers of `resolve`; they degrade to the
/// fallback model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The listing call failed.
    #[error("Model listing failed: {0}")]
    Listing(#[from] ModelError),

    /// The listing succeeded but no candidate matched after exclusions.
    #[error("No usable model among {available} listed candidates")]
    NoCandidates {
        /// Number of candidates left after exclusions.
        available: usize,
    },
}

/// Errors returned by [`crate::ResilientInvoker`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// A required credential or setting is missing. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generation failed on every permitted attempt.
    #[error("Generation failed after {attempts} attempt(s) with model '{model_id}': {source}")]
    Generation {
        /// Model used by the last attempt.
        model_id: String,
        /// Number of attempts made.
        attempts: u8,
        /// Error from the last attempt.
        #[source]
        source: ModelError,
    },
}

impl From<ResolveError> for InvokeError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Configuration(msg) => Self::Configuration(msg),
        }
    }
}

impl InvokeError {
    /// Whether this is a configuration error rather than a generation failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_converts_to_configuration() {
        let err: InvokeError = ResolveError::Configuration("GEMINI_API_KEY is not set".into()).into();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Configuration error: GEMINI_API_KEY is not set");
    }

    #[test]
    fn test_generation_error_display() {
        let err = InvokeError::Generation {
            model_id: "gemini-1.5-pro".to_string(),
            attempts: 2,
            source: ModelError::RequestError("timeout".to_string()),
        };
        assert!(!err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Generation failed after 2 attempt(s) with model 'gemini-1.5-pro': Request Error: timeout"
        );
    }

    #[test]
    fn test_discovery_error_from_model_error() {
        let err: DiscoveryError = ModelError::ModelResponseError("403".into()).into();
        assert!(matches!(err, DiscoveryError::Listing(_)));
    }
}
