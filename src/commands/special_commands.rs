//! Special commands parser for interactive chat
//!
//! This module parses the slash commands that can be entered during an
//! interactive chat. Special commands manage saved sessions, transcripts
//! and the AI provider instead of being sent to the assistant.
//!
//! Commands are prefixed with `/` and are case-insensitive. Arguments keep
//! their original case.

use crate::chat::Provider;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Archive the active session and start a new one
    NewChat,

    /// List saved sessions
    ListChats,

    /// Make the Nth listed session active (1-based)
    SelectChat(usize),

    /// Rename the active session
    RenameChat(String),

    /// Delete the Nth listed session (1-based)
    DeleteChat(usize),

    /// Save the active session as the member's transcript
    SaveTranscript,

    /// Export the active session to HTML (and PDF when configured)
    Export(Option<PathBuf>),

    /// Use another provider
    SwitchProvider(Provider),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

fn split_command(input: &str) -> (String, &str) {
    match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (input.to_lowercase(), ""),
    }
}

fn parse_position(command: &str, arg: &str, usage: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        });
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use medlife::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(parse_special_command("/select 2").unwrap(), SpecialCommand::SelectChat(2));
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (command, arg) = split_command(trimmed);
    match command.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/list" | "/chats" => Ok(SpecialCommand::ListChats),
        "/select" => parse_position("/select", arg, "/select <N>").map(SpecialCommand::SelectChat),
        "/delete" => parse_position("/delete", arg, "/delete <N>").map(SpecialCommand::DeleteChat),
        "/rename" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/rename".to_string(),
                    usage: "/rename <name>".to_string(),
                })
            } else {
                Ok(SpecialCommand::RenameChat(arg.to_string()))
            }
        }
        "/save" => Ok(SpecialCommand::SaveTranscript),
        "/export" => Ok(SpecialCommand::Export(
            (!arg.is_empty()).then(|| PathBuf::from(arg)),
        )),
        "/provider" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/provider".to_string(),
                    usage: "/provider <openai|gemini|claude|mistral>".to_string(),
                });
            }
            arg.parse::<Provider>()
                .map(SpecialCommand::SwitchProvider)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/provider".to_string(),
                    arg: arg.to_string(),
                })
        }
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

/// Display help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new            - Archive this chat and start a new one
  /list           - List saved chats
  /select <N>     - Switch to chat N from /list
  /rename <name>  - Rename the current chat
  /delete <N>     - Delete chat N from /list

TRANSCRIPTS:
  /save           - Save the current chat to the member's record
  /export [FILE]  - Export the current chat to HTML (and PDF when configured)

PROVIDER:
  /provider <name> - Use openai, gemini, claude or mistral (a key must be stored)

SESSION:
  /help           - Show this help message
  /exit           - Leave the chat (also: exit, quit)

Anything else is sent to the assistant.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regular_text_is_none() {
        assert_eq!(
            parse_special_command("what is a normal A1C?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_special_command("/NEW").unwrap(), SpecialCommand::NewChat);
        assert_eq!(parse_special_command("/Help").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_rename_keeps_argument_case() {
        assert_eq!(
            parse_special_command("/rename  Blood Work ").unwrap(),
            SpecialCommand::RenameChat("Blood Work".to_string())
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert!(matches!(
            parse_special_command("/rename"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/select"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_positions() {
        assert!(matches!(
            parse_special_command("/delete 0"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/select two"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_export_optional_path() {
        assert_eq!(
            parse_special_command("/export").unwrap(),
            SpecialCommand::Export(None)
        );
        assert_eq!(
            parse_special_command("/export out/jane.html").unwrap(),
            SpecialCommand::Export(Some(PathBuf::from("out/jane.html")))
        );
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(
            parse_special_command("/provider Claude").unwrap(),
            SpecialCommand::SwitchProvider(Provider::Claude)
        );
        assert!(matches!(
            parse_special_command("/provider copilot"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_special_command("/mode write"),
            Err(CommandError::UnknownCommand("/mode".to_string()))
        );
    }
}
