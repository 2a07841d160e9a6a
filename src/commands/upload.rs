//! `ragsync upload`: send a PDF for processing

use std::path::Path;

use colored::Colorize;

use crate::commands::{start_runtime, watch};
use crate::config::Config;
use crate::error::Result;

/// Upload `file` under the current session, optionally following progress
pub async fn run_upload(config: &Config, file: &Path, follow: bool) -> Result<()> {
    let mut runtime = start_runtime(config).await?;

    let response = match runtime.upload(file).await {
        Ok(response) => response,
        Err(e) => {
            runtime.teardown().await;
            return Err(e);
        }
    };

    println!(
        "{} {} ({})",
        "Uploaded".green().bold(),
        response.filename,
        response.document_id.dimmed()
    );
    if !response.message.is_empty() {
        println!("{}", response.message);
    }

    if follow {
        watch::follow(&runtime).await;
    } else {
        println!(
            "Use {} to follow processing.",
            "ragsync watch".cyan()
        );
    }

    runtime.teardown().await;
    Ok(())
}
