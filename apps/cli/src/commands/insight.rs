//! Insight command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lumen_core::{DataSource, DataSourceKind, InsightGenerator, ReportInsight};
use serde::Deserialize;
use std::path::Path;

/// One entry of the sources file.
#[derive(Debug, Deserialize)]
struct SourceEntry {
    name: String,
    #[serde(rename = "type")]
    kind: DataSourceKind,
    #[serde(default)]
    schema: Option<String>,
}

impl From<SourceEntry> for DataSource {
    fn from(entry: SourceEntry) -> Self {
        match entry.schema {
            Some(schema) => Self { name: entry.name, kind: entry.kind, schema },
            None => Self::with_mock_schema(entry.name, entry.kind),
        }
    }
}

/// Reads data sources from a JSON file.
fn load_sources(path: &Path) -> Result<Vec<DataSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources file {}", path.display()))?;
    let entries: Vec<SourceEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sources file {}", path.display()))?;
    Ok(entries.into_iter().map(DataSource::from).collect())
}

/// Execute the insight command.
pub async fn execute(sources_path: &Path, request: &str, json_output: bool) -> Result<()> {
    let sources = load_sources(sources_path)?;
    let config = super::load_config()?;
    let generator = InsightGenerator::new(config.build_invoker().context("Invalid configuration")?);

    let report = generator.generate_report_insight(&sources, request).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ReportInsight) {
    println!();
    println!("{}", "Insight".bold().cyan());
    println!("  {}", report.insight);
    println!();
    println!("{}", "Query".bold().cyan());
    println!("  {}", report.query);
    println!();
    println!("{} {:?}", "Chart:".bold().cyan(), report.viz_type);
    if let (Some(x), Some(y)) = (&report.viz_config.x_axis, &report.viz_config.y_axis) {
        println!("  {} x {}", x, y);
    }
    println!("  {} preview row(s)", report.viz_config.data.len());
    println!();
}
