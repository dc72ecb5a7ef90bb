//! Lumen Core - AI report generation for the analytics dashboard.
//!
//! This crate provides:
//! - Data-source descriptors with sample schemas
//! - Prompt building and response parsing for report insights
//! - [`InsightGenerator`], which runs the prompt through
//!   [`lumen_models::ResilientInvoker`]
//!
//! # Example
//!
//! ```rust,no_run
//! use lumen_core::{DataSource, DataSourceKind, InsightGenerator};
//! use lumen_models::AiConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let invoker = AiConfig::discover_and_load()?.build_invoker()?;
//! let generator = InsightGenerator::new(invoker);
//! let sources = vec![DataSource::with_mock_schema("Sales", DataSourceKind::Excel)];
//! let report = generator.generate_report_insight(&sources, "Revenue by region").await?;
//! println!("{}", report.insight);
//! # Ok(())
//! # }
//! ```

pub mod datasource;
pub mod error;
pub mod insight;

pub use datasource::{DataSource, DataSourceKind, UnknownKind};
pub use error::{InsightError, Result};
pub use insight::{
    InsightGenerator, ReportInsight, VizConfig, VizType, build_insight_prompt, parse_insight,
};
