//! Interactive chat loop

use super::export::print_exported;
use super::history::{print_sessions, print_transcript, session_id};
use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use super::AppContext;
use crate::chat::{
    ChatSessionManager, KeyPrompt, Provider, SendOutcome, SendStart, TranscriptExporter,
};
use crate::error::{MedlifeError, Result};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Start an interactive chat for a member
///
/// Uses member `index` when given, else the member chat was last opened for.
pub async fn run_chat(ctx: &AppContext, index: Option<u32>) -> Result<()> {
    let email = ctx.require_email()?;
    let member = ctx
        .resolve_member(&email, index)
        .await?
        .ok_or(MedlifeError::NoMemberSelected)?;

    let mut manager = ctx.chat_manager(&email)?;
    manager.load().await?;
    ctx.repo.account(&email).set_current_member(&member)?;
    manager.set_member(Some(member));

    let exporter = TranscriptExporter::new(&ctx.config.export, &ctx.config.chat.assistant_name);
    let mut rl = DefaultEditor::new()?;

    print_welcome_banner(&manager);

    loop {
        let prompt = format!("{} ", "you>".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                };
                match command {
                    SpecialCommand::None => {}
                    SpecialCommand::Exit => break,
                    SpecialCommand::Help => {
                        print_help();
                        continue;
                    }
                    other => {
                        if let Err(e) = run_special(&mut manager, &exporter, other).await {
                            eprintln!("{}", format!("Error: {}", e).red());
                        }
                        continue;
                    }
                }

                rl.add_history_entry(trimmed)?;
                manager.set_draft(trimmed);

                let pending = match manager.begin_send(trimmed).await {
                    Ok(SendStart::Pending(pending)) => pending,
                    Ok(SendStart::Prompt(prompt)) => {
                        ask_for_key(&mut rl, &mut manager, prompt)?;
                        continue;
                    }
                    Ok(SendStart::Ignored) => continue,
                    Err(e) => {
                        eprintln!("{}", format!("Error: {}\n", e).red());
                        continue;
                    }
                };

                // Only a request that is actually issued shows the loading line
                println!("{}", "Analyzing...".dimmed());
                let result = ctx.backend.ask_ai(&pending.query).await;

                match manager.complete_send(pending, result).await {
                    Ok(SendOutcome::Delivered { reply, reprompt }) => {
                        println!(
                            "\n{} {}\n",
                            format!("{}:", manager.assistant_name()).green().bold(),
                            reply.plain_text()
                        );
                        if reprompt {
                            ask_for_key(&mut rl, &mut manager, KeyPrompt::FirstRun)?;
                        }
                    }
                    Ok(SendOutcome::Prompt(prompt)) => {
                        ask_for_key(&mut rl, &mut manager, prompt)?;
                    }
                    Ok(SendOutcome::Ignored) => {}
                    Ok(SendOutcome::Discarded) => {
                        tracing::debug!("Reply arrived for a deleted chat");
                    }
                    Err(e) => eprintln!("{}", format!("Error: {}\n", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn run_special(
    manager: &mut ChatSessionManager,
    exporter: &TranscriptExporter,
    command: SpecialCommand,
) -> Result<()> {
    match command {
        SpecialCommand::NewChat => {
            let name = manager.new_chat().await?.name.clone();
            println!("{}", format!("Started {}", name).green());
        }
        SpecialCommand::ListChats => print_sessions(manager),
        SpecialCommand::SelectChat(index) => {
            let id = session_id(manager, index)?;
            let assistant = manager.assistant_name().to_string();
            let session = manager.select(&id)?;
            print_transcript(session, &assistant);
        }
        SpecialCommand::RenameChat(name) => {
            let id = manager
                .active_id()
                .map(str::to_string)
                .ok_or_else(|| MedlifeError::SessionNotFound("active".to_string()))?;
            manager.rename(&id, &name).await?;
            println!("{}", format!("Renamed chat to {}", name.trim()).green());
        }
        SpecialCommand::DeleteChat(index) => {
            let id = session_id(manager, index)?;
            manager.delete(&id).await?;
            println!("{}", format!("Deleted chat {}", index).green());
            if manager.active().is_none() {
                println!("No chats left. Your next message starts a new one.");
            }
        }
        SpecialCommand::SaveTranscript => {
            manager.save_transcript().await?;
            println!("{}", "Chat saved to the member's record.".green());
        }
        SpecialCommand::Export(output) => {
            let member = manager.member().ok_or(MedlifeError::NoMemberSelected)?;
            let exported = exporter
                .export(member, manager.messages(), output.as_deref())
                .await?;
            print_exported(&exported);
        }
        SpecialCommand::SwitchProvider(provider) => {
            manager.keys_mut().select_provider(provider)?;
            println!("{}", format!("Using {}", provider).green());
        }
        SpecialCommand::Help | SpecialCommand::Exit | SpecialCommand::None => {}
    }
    Ok(())
}

/// Show the key prompt and store what the user enters
///
/// A blank answer dismisses the prompt.
fn ask_for_key(
    rl: &mut DefaultEditor,
    manager: &mut ChatSessionManager,
    prompt: KeyPrompt,
) -> Result<()> {
    println!("{}", prompt.message().yellow());
    if prompt == KeyPrompt::Warning {
        return Ok(());
    }

    let answer = match rl.readline("provider and key (blank to skip)> ") {
        Ok(answer) => answer,
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
        Err(e) => return Err(e.into()),
    };
    let answer = answer.trim();
    if answer.is_empty() {
        return manager.keys_mut().dismiss_prompt();
    }

    let (provider, key) = answer
        .split_once(char::is_whitespace)
        .ok_or_else(|| MedlifeError::validation("key", "Enter a provider name followed by the key"))?;
    let provider: Provider = provider.parse()?;
    manager.keys_mut().set_key(provider, key)?;
    println!(
        "{}",
        format!("Stored {} key. Send your message again.", provider).green()
    );
    Ok(())
}

fn print_welcome_banner(manager: &ChatSessionManager) {
    println!("\n{}", manager.assistant_name().green().bold());
    if let Some(member) = manager.member() {
        println!("Chatting about {}", member.full_name().cyan());
    }
    if let Some(session) = manager.active() {
        println!("Current chat: {}", session.name);
    }
    match manager.keys().selected() {
        Some(provider) => println!("Provider: {}", provider),
        None => println!("{}", "No provider selected yet.".yellow()),
    }
    println!("Type {} for commands.\n", "/help".cyan());
}
