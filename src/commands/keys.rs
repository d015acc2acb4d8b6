//! API key command handlers

use super::AppContext;
use crate::chat::{KeyPromptStatus, Provider};
use crate::cli::KeyCommand;
use crate::credentials::mask_key;
use crate::error::Result;

use colored::Colorize;
use prettytable::{format, row, Table};

/// Handle key commands
pub async fn handle_keys(ctx: &AppContext, command: KeyCommand) -> Result<()> {
    let email = ctx.require_email()?;
    let mut settings = ctx.key_settings(&email)?;

    match command {
        KeyCommand::List => {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(row!["Provider".bold(), "Key".bold(), "Selected".bold()]);
            for provider in Provider::ALL {
                let key = settings
                    .key(provider)?
                    .map(|k| mask_key(&k))
                    .unwrap_or_else(|| "-".to_string());
                let selected = if settings.selected() == Some(provider) {
                    "*".green().to_string()
                } else {
                    String::new()
                };
                table.add_row(row![provider.display_name(), key, selected]);
            }
            println!("\nAPI Keys:");
            table.printstd();
            println!();
            if settings.status() != KeyPromptStatus::HasKeys {
                println!(
                    "Use {} to add a key.",
                    "medlife keys set <PROVIDER> <KEY>".cyan()
                );
            }
        }
        KeyCommand::Set { provider, key } => {
            let provider: Provider = provider.parse()?;
            settings.set_key(provider, &key)?;
            if key.trim().is_empty() {
                println!("{}", format!("Removed {} key", provider).green());
            } else {
                println!("{}", format!("Stored {} key", provider).green());
            }
            match settings.selected() {
                Some(selected) => println!("Selected provider: {}", selected.to_string().cyan()),
                None => println!("{}", "No provider selected.".yellow()),
            }
        }
        KeyCommand::Select { provider } => {
            let provider: Provider = provider.parse()?;
            settings.select_provider(provider)?;
            println!("{}", format!("Selected provider: {}", provider).green());
        }
        KeyCommand::Dismiss => {
            settings.dismiss_prompt()?;
            println!("Key prompt dismissed.");
        }
    }

    Ok(())
}
