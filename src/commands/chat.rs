//! `ragsync chat`: ask questions about the uploaded documents
//!
//! With `--query` one question is sent and answered. Otherwise a
//! readline loop runs until `exit`, Ctrl-C or Ctrl-D.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::chat::{ChatMessage, ConversationSession, Role};
use crate::commands::start_runtime;
use crate::config::Config;
use crate::error::{Result, RagSyncError};

/// Start interactive chat, or answer a single `query`
pub async fn run_chat(config: &Config, query: Option<String>) -> Result<()> {
    let mut runtime = start_runtime(config).await?;

    let outcome = match query {
        Some(query) => ask(runtime.conversation_mut(), &query).await,
        None => interactive(&mut runtime).await,
    };

    runtime.teardown().await;
    outcome
}

async fn interactive(runtime: &mut crate::runtime::SessionRuntime) -> Result<()> {
    let stages = runtime.stages();
    if !stages.overall_completed {
        println!(
            "{}",
            "Processing has not completed; answers may be incomplete.".yellow()
        );
    }

    let earlier = runtime.conversation().messages().len();
    if earlier > 0 {
        println!("{} earlier messages in this session.", earlier);
    }
    println!("Type a question, or {} to leave.\n", "exit".cyan());

    let mut rl = DefaultEditor::new()
        .map_err(|e| RagSyncError::Config(format!("Failed to start line editor: {}", e)))?;

    loop {
        match rl.readline("ragsync> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if matches!(trimmed, "exit" | "quit" | "/exit") {
                    break;
                }

                if let Err(e) = rl.add_history_entry(trimmed) {
                    tracing::debug!(error = %e, "Failed to record readline history");
                }

                // The apology is already in the transcript and printed.
                if let Err(e) = ask(runtime.conversation_mut(), trimmed).await {
                    tracing::debug!(error = %e, "Chat turn failed");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(RagSyncError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    e.to_string(),
                ))
                .into());
            }
        }
    }

    Ok(())
}

async fn ask(conversation: &mut ConversationSession, query: &str) -> Result<()> {
    match conversation.send(query).await {
        Ok(answer) => {
            print_message(&answer);
            Ok(())
        }
        Err(e) => {
            if let Some(apology) = conversation.messages().last() {
                if apology.role == Role::Assistant {
                    print_message(apology);
                }
            }
            eprintln!("{} {}", "Error:".red().bold(), e);
            Err(e)
        }
    }
}

/// Print one transcript message with its supporting-content summary
pub(crate) fn print_message(message: &ChatMessage) {
    let label = match message.role {
        Role::User => "you".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
    };
    println!("{} {}", label, message.content);

    if let Some(metadata) = &message.metadata {
        let mut notes = Vec::new();
        if metadata.chunks_used > 0 {
            notes.push(format!("{} chunks", metadata.chunks_used));
        }
        if metadata.has_tables {
            notes.push(format!("{} tables", metadata.tables.len()));
        }
        if metadata.has_images {
            notes.push(format!("{} images", metadata.images.len()));
        }
        if !notes.is_empty() {
            println!("  {}", format!("used {}", notes.join(", ")).dimmed());
        }
    }
    println!();
}
