//! Account command handlers

use super::AppContext;
use crate::auth::EntryRoute;
use crate::error::Result;
use crate::validation::LoginChannel;

use chrono::Utc;
use colored::Colorize;

/// Show where the app opens for the stored session
pub async fn run_start(ctx: &AppContext) -> Result<EntryRoute> {
    let route = ctx.guard().route(Utc::now()).await;
    match &route {
        EntryRoute::Landing => {
            println!("{}", "Not signed in.".yellow());
            println!(
                "Use {} or {} to get started.",
                "medlife signup".cyan(),
                "medlife login <EMAIL|PHONE>".cyan()
            );
        }
        EntryRoute::Dashboard { email } => {
            let name = ctx.auth().username(email).await;
            println!("Welcome back, {}!", name.green().bold());
            println!("Use {} to see your family members.", "medlife members list".cyan());
        }
        EntryRoute::Chat { email, member } => {
            let name = ctx.auth().username(email).await;
            println!("Welcome back, {}!", name.green().bold());
            println!(
                "Continuing with {}. Use {} to chat.",
                member.full_name().cyan(),
                format!("medlife chat --member {}", member.member_index).cyan()
            );
        }
    }
    Ok(route)
}

pub async fn run_signup(ctx: &AppContext, username: &str, email: &str, mobile: &str) -> Result<()> {
    ctx.auth().signup(username, email, mobile).await?;
    println!("{}", "Account created. Log in to continue.".green());
    Ok(())
}

pub async fn run_login(ctx: &AppContext, identifier: &str) -> Result<()> {
    let channel = ctx.auth().request_otp(identifier).await?;
    let via = match channel {
        LoginChannel::Email => "email",
        LoginChannel::Sms => "SMS",
    };
    println!("{}", format!("A login code was sent by {}.", via).green());
    println!(
        "Run {} to finish signing in.",
        format!("medlife verify {} <OTP>", identifier.trim()).cyan()
    );
    Ok(())
}

pub async fn run_verify(ctx: &AppContext, identifier: &str, otp: &str) -> Result<()> {
    let email = ctx.auth().verify_otp(identifier, otp, Utc::now()).await?;
    println!("{}", format!("Signed in as {}", email).green());
    Ok(())
}

pub async fn run_forgot_password(ctx: &AppContext, email: &str) -> Result<()> {
    ctx.auth().forgot_password(email).await?;
    println!("{}", "A reset code was sent to your email.".green());
    Ok(())
}

pub async fn run_reset_password(
    ctx: &AppContext,
    email: Option<&str>,
    otp: &str,
    password: &str,
    confirm: &str,
) -> Result<()> {
    ctx.auth()
        .reset_password(email, otp, password, confirm)
        .await?;
    println!("{}", "Password updated. Log in with your new password.".green());
    Ok(())
}

pub fn run_logout(ctx: &AppContext) -> Result<()> {
    ctx.auth().logout()?;
    println!("{}", "Logged out.".green());
    Ok(())
}
