//! Generate command implementation.

use anyhow::{Context, Result};
use serde_json::json;

/// Execute the generate command.
pub async fn execute(prompt: &str, json_output: bool) -> Result<()> {
    let config = super::load_config()?;
    let invoker = config.build_invoker().context("Invalid configuration")?;

    let response = invoker.generate(prompt, None).await?;

    if json_output {
        let output = json!({
            "content": response.content,
            "model_id": response.model_id,
            "usage": response.usage,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", response.content);
    }

    Ok(())
}
