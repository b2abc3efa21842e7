//! Curator CLI - Build LoRA training datasets with vision-language models.
//!
//! Curator scores every image against a concept, keeps the ones that reach
//! the threshold, annotates the keepers without naming the concept, and
//! writes `lora_dataset.zip` with one `.txt` sidecar per image.
//!
//! # Usage
//!
//! ```bash
//! # Curate a folder with the cloud flash model
//! curator run ./photos --concept "vintage school bus"
//!
//! # Use a local LM Studio server and tag-style annotations
//! curator run ./photos -c "red fox" --provider local --mode tags --threshold 0.7
//!
//! # Check that a backend is reachable
//! curator check --provider local
//!
//! # View configuration
//! curator config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Curator - Score, filter, annotate and package LoRA training images.
#[derive(Parser, Debug)]
#[command(name = "curator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Score, filter and annotate images, then export the dataset archive
    Run(cli::run::RunArgs),

    /// Validate the provider connection and list available models
    Check(cli::check::CheckArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go straight to stderr
    let config = match curator_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `curator config path`."
            );
            curator_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Curator v{}", curator_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Check(args) => cli::check::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
