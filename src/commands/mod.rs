/*!
Command handlers for the CLI

Each submodule handles one `ragsync` subcommand:

- `status`  - cached session and progress, no network
- `watch`   - follow processing progress live
- `upload`  - send a PDF, optionally followed by `watch`
- `chat`    - interactive or single-shot questions
- `history` - server-side transcript
- `reset`   - clear the server session and start a new one

The helpers here build the shared pieces (store, API client, runtime) from
configuration and render progress for the terminal.
*/

use std::sync::Arc;

use colored::{ColoredString, Colorize};
use prettytable::{format, Table};

use crate::api::{ApiClient, RagApi};
use crate::config::Config;
use crate::error::Result;
use crate::live::{LiveState, WebSocketTransport};
use crate::progress::{DerivedStages, ProgressSnapshot, StageStatus};
use crate::runtime::{RuntimeOptions, SessionRuntime};
use crate::session::SystemClock;
use crate::storage::{LocalStore, SledStore};

pub mod chat;
pub mod history;
pub mod reset;
pub mod status;
pub mod upload;
pub mod watch;

/// Open the configured local store
pub(crate) fn open_store(config: &Config) -> Result<Arc<dyn LocalStore>> {
    let store = match &config.storage.path {
        Some(path) => SledStore::open(path)?,
        None => SledStore::open_default()?,
    };
    Ok(Arc::new(store))
}

/// Build the HTTP API client from configuration
pub(crate) fn api_client(config: &Config) -> Result<Arc<dyn RagApi>> {
    let client = ApiClient::new(config.api_base_url()?, config.request_timeout())?
        .with_max_upload_bytes(config.upload.max_upload_bytes);
    Ok(Arc::new(client))
}

/// Start a runtime against the real store, WebSocket transport and API
pub(crate) async fn start_runtime(config: &Config) -> Result<SessionRuntime> {
    SessionRuntime::init(
        RuntimeOptions::from_config(config)?,
        open_store(config)?,
        Arc::new(SystemClock),
        Arc::new(WebSocketTransport::new()),
        api_client(config)?,
    )
    .await
}

fn status_cell(status: StageStatus) -> ColoredString {
    match status {
        StageStatus::Pending => "pending".dimmed(),
        StageStatus::Active => "active".yellow().bold(),
        StageStatus::Completed => "completed".green(),
    }
}

/// Stage table for the terminal
pub(crate) fn stage_table(stages: &DerivedStages) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["Stage".bold(), "Status".bold()]);
    for (name, status) in stages.rows() {
        table.add_row(prettytable::row![name, status_cell(status)]);
    }
    table
}

/// One-line summary of a snapshot
pub(crate) fn describe_snapshot(snapshot: &ProgressSnapshot) -> String {
    let mut line = format!(
        "{} [{}] {:>3}%",
        snapshot.stage, snapshot.status, snapshot.progress
    );
    if !snapshot.message.is_empty() {
        line.push_str(" - ");
        line.push_str(&snapshot.message);
    }
    line
}

/// Print the snapshot summary, its details and the stage table
pub(crate) fn print_progress(state: &LiveState) {
    match &state.snapshot {
        Some(snapshot) => {
            println!("{}", describe_snapshot(snapshot));
            if let Some(details) = &snapshot.details {
                if let Some(filename) = &details.filename {
                    println!("  {} {}", "file:".dimmed(), filename);
                }
                if let Some(count) = details.elements_count {
                    println!("  {} {}", "elements:".dimmed(), count);
                }
                if let Some(count) = details.chunks_count {
                    println!("  {} {}", "chunks:".dimmed(), count);
                }
                if let Some(count) = details.vectors_stored {
                    println!("  {} {}", "vectors:".dimmed(), count);
                }
            }
        }
        None => println!("{}", "No processing progress yet.".yellow()),
    }

    let stages = state.stages();
    stage_table(&stages).printstd();
    if stages.failed {
        println!("{}", "Processing failed.".red().bold());
    } else if stages.overall_completed {
        println!("{}", "Processing complete.".green().bold());
    }
}
