//! Medlife - family health assistant client
//!
#![doc = "Medlife - family health assistant client"]
#![doc = "Main entry point for the Medlife command-line application."]

use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medlife::cli::{Cli, Commands};
use medlife::commands::{self, AppContext};
use medlife::config::Config;
use medlife::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.json_logs);

    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    let ctx = AppContext::new(config, cli.ephemeral)?;

    match cli.command {
        Commands::Start => {
            commands::auth::run_start(&ctx).await?;
        }
        Commands::Signup {
            username,
            email,
            mobile,
        } => commands::auth::run_signup(&ctx, &username, &email, &mobile).await?,
        Commands::Login { identifier } => commands::auth::run_login(&ctx, &identifier).await?,
        Commands::Verify { identifier, otp } => {
            commands::auth::run_verify(&ctx, &identifier, &otp).await?
        }
        Commands::ForgotPassword { email } => {
            commands::auth::run_forgot_password(&ctx, &email).await?
        }
        Commands::ResetPassword {
            otp,
            password,
            confirm,
            email,
        } => {
            commands::auth::run_reset_password(&ctx, email.as_deref(), &otp, &password, &confirm)
                .await?
        }
        Commands::Logout => commands::auth::run_logout(&ctx)?,
        Commands::Members { command } => {
            tracing::debug!("Running member command: {:?}", command);
            commands::members::handle_members(&ctx, command).await?
        }
        Commands::Keys { command } => commands::keys::handle_keys(&ctx, command).await?,
        Commands::Chat { member } => {
            tracing::info!("Starting interactive chat");
            commands::chat::run_chat(&ctx, member).await?
        }
        Commands::History { command } => commands::history::handle_history(&ctx, command).await?,
        Commands::Export { member, output } => {
            commands::export::run_export(&ctx, member, output.as_deref()).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "medlife=debug" } else { "medlife=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
