use std::sync::Arc;

use colored::Colorize;
use prettytable::{format, Table};

use crate::chat::{ChatMessage, Role};
use crate::commands::{api_client, open_store};
use crate::config::Config;
use crate::error::Result;
use crate::session::{SessionManager, SystemClock};

const PREVIEW_CHARS: usize = 60;

/// Print the server-side transcript for the current session
pub async fn show_history(config: &Config) -> Result<()> {
    let sessions = SessionManager::new(open_store(config)?, Arc::new(SystemClock))
        .with_ttl_ms(config.session.ttl_ms);
    let token = sessions.resolve_session()?;
    let api = api_client(config)?;

    let messages: Vec<ChatMessage> = api
        .chat_history(&token)
        .await?
        .into_iter()
        .filter_map(ChatMessage::from_history)
        .collect();

    if messages.is_empty() {
        println!("{}", "No chat history for this session.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Time".bold(),
        "Role".bold(),
        "Message".bold(),
        "Tables".bold(),
        "Images".bold()
    ]);

    for message in &messages {
        let role = match message.role {
            Role::User => "user".cyan(),
            Role::Assistant => "assistant".green(),
        };
        let (tables, images) = message
            .metadata
            .as_ref()
            .map(|m| (m.tables.len(), m.images.len()))
            .unwrap_or((0, 0));

        table.add_row(prettytable::row![
            message.timestamp,
            role,
            preview(&message.content),
            tables,
            images
        ]);
    }

    println!("\nChat history for {}:", token.cyan());
    table.printstd();
    println!();

    Ok(())
}

fn preview(content: &str) -> String {
    let single_line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    } else {
        single_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_collapses_whitespace() {
        assert_eq!(preview("a\n  b\tc"), "a b c");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(100);
        let short = preview(&long);
        assert_eq!(short.chars().count(), PREVIEW_CHARS);
        assert!(short.ends_with("..."));
    }
}
