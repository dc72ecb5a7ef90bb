//! Config command implementation.

use anyhow::Result;
use colored::Colorize;
use lumen_models::AiConfig;

/// Print the effective configuration as TOML.
pub fn execute() -> Result<()> {
    let config = super::load_config()?;
    config.validate()?;

    let key_status = if config.api_key.is_some() { "set".green() } else { "not set".red() };
    println!("# api key: {}", key_status);
    let effective = AiConfig { cache: Some(config.cache_config()), ..config };
    println!("{}", toml::to_string_pretty(&effective)?);

    Ok(())
}
