//! Transcript export command handler

use super::AppContext;
use crate::chat::{fetch_transcript, ExportedTranscript, TranscriptExporter};
use crate::error::{MedlifeError, Result};

use colored::Colorize;
use std::path::Path;

/// Export the stored transcript of a member
///
/// Uses member `index` when given, else the member chat was last opened for.
pub async fn run_export(
    ctx: &AppContext,
    index: Option<u32>,
    output: Option<&Path>,
) -> Result<ExportedTranscript> {
    let email = ctx.require_email()?;
    let member = ctx
        .resolve_member(&email, index)
        .await?
        .ok_or(MedlifeError::NoMemberSelected)?;

    let messages = fetch_transcript(ctx.backend.as_ref(), &email, &member).await?;
    let exporter = TranscriptExporter::new(&ctx.config.export, &ctx.config.chat.assistant_name);
    let exported = exporter.export(&member, &messages, output).await?;
    print_exported(&exported);
    Ok(exported)
}

pub fn print_exported(exported: &ExportedTranscript) {
    println!(
        "{}",
        format!("Transcript written to {}", exported.html.display()).green()
    );
    if let Some(pdf) = &exported.pdf {
        println!("{}", format!("PDF written to {}", pdf.display()).green());
    }
}
