//! Command implementations for the Lumen CLI.

pub mod config;
pub mod generate;
pub mod insight;
pub mod models;
pub mod resolve;

use anyhow::{Context, Result};
use lumen_models::AiConfig;

/// Loads the effective configuration from files and the environment.
pub(crate) fn load_config() -> Result<AiConfig> {
    AiConfig::discover_and_load().context("Failed to load configuration")
}
