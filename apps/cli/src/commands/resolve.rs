//! Resolve command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lumen_models::ModelSource;
use serde_json::json;
use std::collections::HashSet;

/// Execute the resolve command.
pub async fn execute(force: bool, excluded: Vec<String>, json_output: bool) -> Result<()> {
    let config = super::load_config()?;
    let resolver = config.build_resolver().context("Invalid configuration")?;

    let excluded: HashSet<String> = excluded.into_iter().collect();
    let resolved = resolver.resolve(force, &excluded).await?;

    if json_output {
        let output = json!({
            "model_id": resolved.model_id,
            "source": resolved.source,
            "expires_at": resolver.cached_model().map(|entry| entry.expires_at),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let source = match resolved.source {
        ModelSource::Cache => "cache".green(),
        ModelSource::Discovered => "discovered".green(),
        ModelSource::Fallback => "fallback, not verified against the account".yellow(),
    };
    println!("{} ({})", resolved.model_id.bold(), source);

    Ok(())
}
