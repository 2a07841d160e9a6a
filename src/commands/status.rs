//! `ragsync status`: show the stored session without touching the network

use std::sync::Arc;

use chrono::TimeZone;
use colored::Colorize;

use crate::commands::{open_store, print_progress};
use crate::config::Config;
use crate::error::Result;
use crate::live::{ConnectionPhase, LiveState};
use crate::session::{SessionManager, SystemClock};

/// Print the stored token, its last activity and the cached progress.
///
/// Read-only: the session is neither created nor refreshed.
pub fn show_status(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let sessions = SessionManager::new(store, Arc::new(SystemClock))
        .with_ttl_ms(config.session.ttl_ms);

    let Some(token) = sessions.current()? else {
        println!("{}", "No session yet.".yellow());
        println!(
            "Use {} to upload a document and start one.",
            "ragsync upload <FILE>".cyan()
        );
        return Ok(());
    };

    println!("{} {}", "Session:".bold(), token.cyan());
    if let Some(last) = sessions.last_activity()? {
        match chrono::Utc.timestamp_millis_opt(last).single() {
            Some(at) => println!(
                "{} {}",
                "Last activity:".bold(),
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("{} {}", "Last activity:".bold(), last),
        }
    }
    println!();

    let state = LiveState {
        snapshot: sessions.cache().load(&token),
        connected: false,
        phase: ConnectionPhase::Idle,
    };
    print_progress(&state);

    Ok(())
}
