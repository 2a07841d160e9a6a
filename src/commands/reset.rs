//! `ragsync reset`: clear the server session and mint a new token

use colored::Colorize;

use crate::commands::start_runtime;
use crate::config::Config;
use crate::error::Result;

/// Clear all data for the current session and start a new one.
///
/// The local session is only replaced once the server has confirmed.
pub async fn run_reset(config: &Config) -> Result<()> {
    let mut runtime = start_runtime(config).await?;
    let old = runtime.token().to_string();

    let outcome = runtime.reset().await;
    runtime.teardown().await;

    let token = outcome?;
    println!("{} {}", "Cleared session".green(), old.dimmed());
    println!("{} {}", "New session:".bold(), token.cyan());
    Ok(())
}
