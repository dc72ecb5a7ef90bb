//! Error types for Lumen Core.

use lumen_models::InvokeError;
use thiserror::Error;

/// Errors from report insight generation.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The project has no data sources to describe to the model.
    #[error("No data sources found. Please connect a data source first.")]
    NoDataSources,

    /// The user request was empty.
    #[error("The report request must not be empty")]
    EmptyRequest,

    /// The AI layer could not produce a response.
    #[error("Failed to generate report. AI service might be unavailable.")]
    ServiceUnavailable(#[source] InvokeError),

    /// The model answered with something that is not a valid insight.
    #[error("Failed to parse AI response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;
