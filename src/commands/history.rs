//! Saved chat session command handlers

use super::AppContext;
use crate::chat::{ChatSession, ChatSessionManager, Sender};
use crate::cli::HistoryCommand;
use crate::error::{MedlifeError, Result};

use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub async fn handle_history(ctx: &AppContext, command: HistoryCommand) -> Result<()> {
    let email = ctx.require_email()?;
    let mut manager = ctx.chat_manager(&email)?;
    manager.load().await?;

    match command {
        HistoryCommand::List => print_sessions(&manager),
        HistoryCommand::Select { index } => {
            let id = session_id(&manager, index)?;
            let assistant = manager.assistant_name().to_string();
            let session = manager.select(&id)?;
            print_transcript(session, &assistant);
        }
        HistoryCommand::Rename { index, name } => {
            let id = session_id(&manager, index)?;
            manager.rename(&id, &name).await?;
            println!("{}", format!("Renamed chat {} to {}", index, name.trim()).green());
        }
        HistoryCommand::Delete { index } => {
            let id = session_id(&manager, index)?;
            manager.delete(&id).await?;
            println!("{}", format!("Deleted chat {}", index).green());
        }
    }

    Ok(())
}

/// Id of the session listed at 1-based `index`
pub fn session_id(manager: &ChatSessionManager, index: usize) -> Result<String> {
    index
        .checked_sub(1)
        .and_then(|i| manager.sessions().get(i))
        .map(|s| s.id.clone())
        .ok_or_else(|| MedlifeError::SessionNotFound(format!("#{}", index)).into())
}

/// Print the session list, marking the active one
pub fn print_sessions(manager: &ChatSessionManager) {
    let sessions = manager.sessions();
    if sessions.is_empty() {
        println!("{}", "No saved chats.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["#".bold(), "Name".bold(), "Messages".bold(), "".bold()]);

    for (i, session) in sessions.iter().enumerate() {
        let name = if session.name.chars().count() > 40 {
            format!("{}...", session.name.chars().take(37).collect::<String>())
        } else {
            session.name.clone()
        };
        let marker = if manager.active_id() == Some(session.id.as_str()) {
            "active".green().to_string()
        } else {
            String::new()
        };
        table.add_row(prettytable::row![
            (i + 1).to_string().cyan(),
            name,
            session.messages.iter().filter(|m| !m.is_placeholder()).count(),
            marker
        ]);
    }

    println!("\nSaved Chats:");
    table.printstd();
    println!();
}

/// Print every message of `session`
pub fn print_transcript(session: &ChatSession, assistant_name: &str) {
    println!("\n{}", session.name.bold());
    if session.messages.is_empty() {
        println!("{}", "(empty)".dimmed());
    }
    for message in &session.messages {
        let text = message.plain_text();
        match message.sender {
            Sender::User => println!("{} {}", "You:".cyan().bold(), text),
            Sender::Assistant => {
                println!("{} {}", format!("{}:", assistant_name).green().bold(), text)
            }
        }
    }
    println!();
}
