//! Lumen CLI - Command-line access to the Lumen AI layer.
//!
//! Provides a `lumen` command for inspecting model discovery, resolving the
//! model the dashboard would use, and generating text or report insights
//! through the resilient invoker.

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, generate, insight, models, resolve};

/// Lumen CLI - AI model resolution and report insights
#[derive(Parser, Debug)]
#[command(
    name = "lumen",
    author,
    version,
    about = "Lumen - AI model resolution and report insights",
    long_about = "Lumen resolves the best available Gemini model for the account, caches the \
                  choice and retries once on a different model when generation fails."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models the backend advertises for generation
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve the model that would be used for generation
    Resolve {
        /// Skip the cache and rediscover
        #[arg(long)]
        force: bool,

        /// Model identifiers to exclude from discovery (repeatable)
        #[arg(long = "exclude", value_name = "MODEL")]
        excluded: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate text for a prompt
    Generate {
        /// Prompt text
        #[arg(required = true)]
        prompt: Vec<String>,

        /// Output the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a report insight over a set of data sources
    ///
    /// The sources file holds a JSON array of
    /// `{"name": ..., "type": "EXCEL|POSTGRES|MYSQL|BIGQUERY", "schema": ...}`
    /// objects. `schema` may be omitted to use the sample schema for the type.
    Insight {
        /// Path to the data sources JSON file
        #[arg(short, long)]
        sources: PathBuf,

        /// Report request
        #[arg(required = true)]
        request: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration (the API key is never printed)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Models { json } => models::execute(json).await?,
        Command::Resolve { force, excluded, json } => resolve::execute(force, excluded, json).await?,
        Command::Generate { prompt, json } => generate::execute(&prompt.join(" "), json).await?,
        Command::Insight { sources, request, json } => {
            insight::execute(&sources, &request.join(" "), json).await?;
        }
        Command::Config => config::execute()?,
    }

    Ok(())
}
