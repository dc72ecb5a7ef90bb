//! AI-generated report insights.
//!
//! Builds the analyst prompt from a project's data sources, sends it through
//! the resilient invoker and parses the model's JSON answer into a
//! [`ReportInsight`]. The query in the answer is never executed; the chart
//! rows are preview data produced by the model.

use lumen_models::ResilientInvoker;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, error, info};

use crate::datasource::DataSource;
use crate::error::{InsightError, Result};

/// Chart type for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VizType {
    /// Bar chart.
    Bar,
    /// Line chart.
    Line,
    /// Pie chart.
    Pie,
    /// Plain table.
    Table,
}

/// Chart configuration plus preview rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VizConfig {
    /// Column plotted on the x axis.
    #[serde(default)]
    pub x_axis: Option<String>,
    /// Column plotted on the y axis.
    #[serde(default)]
    pub y_axis: Option<String>,
    /// Optional grouping column.
    #[serde(default)]
    pub series: Option<String>,
    /// Preview rows keyed by column name.
    #[serde(default)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// What the model returns for a report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInsight {
    /// SQL (or pseudo-query for spreadsheets) answering the request.
    pub query: String,
    /// Suggested chart type.
    pub viz_type: VizType,
    /// Chart configuration.
    pub viz_config: VizConfig,
    /// One or two sentence takeaway.
    pub insight: String,
}

const RESPONSE_CONTRACT: &str = r#"Respond with JSON only, without markdown:
{
    "query": "SQL query (or pseudo-query for spreadsheets)",
    "vizType": "BAR" | "LINE" | "PIE" | "TABLE",
    "vizConfig": {
        "xAxis": "column_name",
        "yAxis": "column_name",
        "series": "column_name (optional)",
        "data": [{"column_name": "value"}]
    },
    "insight": "One or two sentences about what this data might show."
}
Fill "data" with 5-10 rows of realistic sample values whose keys match the
query's result columns. They are used as a preview; the query is not executed."#;

/// Renders the analyst prompt for `request` over `sources`.
///
/// # Errors
/// Returns `InsightError::NoDataSources` for an empty source list and
/// `InsightError::EmptyRequest` for a blank request.
pub fn build_insight_prompt(sources: &[DataSource], request: &str) -> Result<String> {
    if sources.is_empty() {
        return Err(InsightError::NoDataSources);
    }
    let request = request.trim();
    if request.is_empty() {
        return Err(InsightError::EmptyRequest);
    }

    let schemas = sources
        .iter()
        .map(|ds| format!("Source: {} ({})\nSchema: {}", ds.name, ds.kind, ds.schema))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut prompt = String::from(
        "You are an AI data analyst. Write a query, pick a visualization and give a short \
         insight answering the user's request over the data sources below.\n\n",
    );
    let _ = write!(prompt, "Data Sources:\n{schemas}\n\n");
    let _ = write!(prompt, "User Request: \"{request}\"\n\n");
    prompt.push_str(RESPONSE_CONTRACT);
    Ok(prompt)
}

/// Parses a model answer into a [`ReportInsight`].
///
/// Markdown code fences are removed first. If the remaining text is not
/// JSON on its own, the outermost `{...}` span is tried.
///
/// # Errors
/// Returns `InsightError::MalformedResponse` if no valid insight is found.
pub fn parse_insight(text: &str) -> Result<ReportInsight> {
    let cleaned = strip_code_fences(text);

    match serde_json::from_str(&cleaned) {
        Ok(insight) => Ok(insight),
        Err(first_err) => {
            let span = cleaned.find('{').zip(cleaned.rfind('}')).filter(|(start, end)| start < end);
            match span {
                Some((start, end)) => serde_json::from_str(&cleaned[start..=end])
                    .map_err(|e| InsightError::MalformedResponse(e.to_string())),
                None => Err(InsightError::MalformedResponse(first_err.to_string())),
            }
        }
    }
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Generates report insights through the resilient invoker.
#[derive(Debug, Clone)]
pub struct InsightGenerator {
    invoker: ResilientInvoker,
}

impl InsightGenerator {
    /// Creates a generator using `invoker`.
    pub fn new(invoker: ResilientInvoker) -> Self {
        Self { invoker }
    }

    /// Asks the model for a report answering `request` over `sources`.
    ///
    /// # Errors
    /// Returns `InsightError::ServiceUnavailable` when the AI layer fails
    /// (including missing credentials), `MalformedResponse` when its answer
    /// cannot be parsed, and the prompt-building errors of
    /// [`build_insight_prompt`].
    pub async fn generate_report_insight(
        &self,
        sources: &[DataSource],
        request: &str,
    ) -> Result<ReportInsight> {
        let prompt = build_insight_prompt(sources, request)?;
        debug!(sources = sources.len(), prompt_len = prompt.len(), "Requesting report insight");

        let text = self.invoker.generate_content(&prompt).await.map_err(|e| {
            error!(error = %e, "AI generation error");
            InsightError::ServiceUnavailable(e)
        })?;

        let insight = parse_insight(&text)?;
        info!(viz_type = ?insight.viz_type, rows = insight.viz_config.data.len(), "Generated report insight");
        Ok(insight)
    }
}
