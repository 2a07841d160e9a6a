//! ragsync - follow document processing and chat with a RAG service
//!
//! Main entry point for the ragsync CLI.

use anyhow::Result;

use ragsync::cli::{Cli, Commands};
use ragsync::commands;
use ragsync::config::Config;
use ragsync::logging::init_logging;

const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    init_logging(&config.logging)?;
    config.validate()?;

    match cli.command {
        Commands::Status => {
            commands::status::show_status(&config)?;
        }
        Commands::Watch => {
            tracing::info!("Starting watch mode");
            commands::watch::run_watch(&config).await?;
        }
        Commands::Upload { file, watch } => {
            tracing::info!("Uploading {}", file.display());
            commands::upload::run_upload(&config, &file, watch).await?;
        }
        Commands::Chat { query } => {
            tracing::info!("Starting chat");
            commands::chat::run_chat(&config, query).await?;
        }
        Commands::History => {
            commands::history::show_history(&config).await?;
        }
        Commands::Reset => {
            tracing::info!("Resetting session");
            commands::reset::run_reset(&config).await?;
        }
    }

    Ok(())
}
