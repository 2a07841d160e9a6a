//! Command-line interface definition for ragsync
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragsync - follow document processing and chat with a RAG service
///
/// Keeps one session per local store, shows live processing progress,
/// and sends questions about the uploaded documents.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Local state directory (overrides storage.path)
    #[arg(long, env = "RAGSYNC_STORE_PATH")]
    pub store: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ragsync
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the session token and last known processing progress
    Status,

    /// Follow processing progress live until it finishes
    Watch,

    /// Upload a PDF for processing
    Upload {
        /// Path to the PDF file
        file: PathBuf,

        /// Follow processing progress after the upload
        #[arg(short, long)]
        watch: bool,
    },

    /// Ask questions about the uploaded documents
    Chat {
        /// Send a single question instead of starting an interactive session
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Print the server-side chat transcript
    History,

    /// Clear all session data on the server and start a new session
    Reset,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
