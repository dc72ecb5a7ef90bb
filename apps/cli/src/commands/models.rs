//! Models command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;

/// Execute the models command.
pub async fn execute(json_output: bool) -> Result<()> {
    let config = super::load_config()?;
    let resolver = config.build_resolver().context("Invalid configuration")?;
    resolver.ensure_configured()?;

    let models = resolver.list_candidates().await.context("Failed to list models")?;
    let preferred = resolver.priority().select(&models).map(str::to_string);

    if json_output {
        let output = json!({
            "models": models,
            "preferred": preferred,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Available Models ({})", models.len()).bold().cyan());
    println!();

    if models.is_empty() {
        println!("  {}", "No models support content generation for this key.".dimmed());
        return Ok(());
    }

    for model in &models {
        if preferred.as_deref() == Some(model.as_str()) {
            println!("  {} {}", model.green(), "(preferred)".dimmed());
        } else {
            println!("  {}", model);
        }
    }
    println!();

    Ok(())
}
