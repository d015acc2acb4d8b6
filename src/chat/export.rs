//! Transcript export
//!
//! Renders a conversation into a standalone HTML document. Turning that
//! document into a PDF is left to an optional external converter, invoked
//! as `<converter> <html> <pdf>`.

use super::session::{Message, Sender, USER_DISPLAY_NAME};
use crate::config::ExportConfig;
use crate::error::{MedlifeError, Result};
use crate::members::Member;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// File name stem used for a member's transcript
///
/// # Examples
///
/// ```
/// use medlife::chat::transcript_file_stem;
/// use medlife::members::Member;
///
/// let member = Member { first_name: "Jane".into(), last_name: "Doe".into(), ..Default::default() };
/// assert_eq!(transcript_file_stem(&member), "Chat_History_Jane_Doe");
/// ```
pub fn transcript_file_stem(member: &Member) -> String {
    format!("Chat_History_{}", member.transcript_name())
}

/// Render the HTML transcript
pub fn render_transcript_html(
    member_name: &str,
    assistant_name: &str,
    messages: &[Message],
    generated_on: NaiveDate,
) -> String {
    let member_name = escape_html(member_name);
    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Chat History - {member}</title>
  <style>
    body {{ font-family: Arial, sans-serif; padding: 20px; line-height: 1.6; }}
    .header {{ text-align: center; margin-bottom: 30px; border-bottom: 2px solid #fe786b; padding-bottom: 20px; }}
    .message {{ margin-bottom: 15px; padding: 12px; border-radius: 8px; max-width: 80%; }}
    .user-message {{ background-color: #e3f2fd; margin-left: 20%; text-align: right; }}
    .ai-message {{ background-color: #f8f9fa; margin-right: 20%; }}
    .message-header {{ font-weight: bold; margin-bottom: 5px; color: #333; }}
    .message-content {{ color: #555; white-space: pre-wrap; }}
  </style>
</head>
<body>
  <h1>{assistant} - Chat History</h1>
  <div class="header">
    <p><strong>Generated on:</strong> {date}</p>
    <p><strong>Member:</strong> {member}</p>
  </div>
"#,
        member = member_name,
        assistant = escape_html(assistant_name),
        date = generated_on.format("%Y-%m-%d"),
    );

    for message in messages.iter().filter(|m| !m.is_placeholder()) {
        let (class, sender) = match message.sender {
            Sender::User => ("user-message", USER_DISPLAY_NAME),
            Sender::Assistant => ("ai-message", assistant_name),
        };
        html.push_str(&format!(
            "  <div class=\"message {}\">\n    <div class=\"message-header\">{}</div>\n    <div class=\"message-content\">{}</div>\n  </div>\n",
            class,
            escape_html(sender),
            escape_html(&message.plain_text()),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Files produced by an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedTranscript {
    pub html: PathBuf,
    /// Present when a converter is configured
    pub pdf: Option<PathBuf>,
}

/// Writes transcripts to disk
pub struct TranscriptExporter {
    assistant_name: String,
    output_dir: PathBuf,
    converter: Option<String>,
}

impl TranscriptExporter {
    pub fn new(config: &ExportConfig, assistant_name: &str) -> Self {
        Self {
            assistant_name: assistant_name.to_string(),
            output_dir: PathBuf::from(&config.output_dir),
            converter: config.converter.clone().filter(|c| !c.trim().is_empty()),
        }
    }

    /// Export `messages` of `member`
    ///
    /// `output` overrides the default `<output_dir>/Chat_History_<First>_<Last>.html`.
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::Export` when there is nothing to export or the
    /// converter fails.
    pub async fn export(
        &self,
        member: &Member,
        messages: &[Message],
        output: Option<&Path>,
    ) -> Result<ExportedTranscript> {
        if messages.iter().all(Message::is_placeholder) {
            return Err(MedlifeError::Export(
                super::manager::MSG_EMPTY_TRANSCRIPT.to_string(),
            )
            .into());
        }

        let html_path = match output {
            Some(path) => path.with_extension("html"),
            None => self
                .output_dir
                .join(format!("{}.html", transcript_file_stem(member))),
        };
        if let Some(parent) = html_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let html = render_transcript_html(
            &member.full_name(),
            &self.assistant_name,
            messages,
            chrono::Local::now().date_naive(),
        );
        tokio::fs::write(&html_path, html).await?;
        tracing::info!("Wrote transcript to {}", html_path.display());

        let pdf = match &self.converter {
            Some(converter) => {
                let pdf_path = html_path.with_extension("pdf");
                run_converter(converter, &html_path, &pdf_path).await?;
                Some(pdf_path)
            }
            None => None,
        };

        Ok(ExportedTranscript {
            html: html_path,
            pdf,
        })
    }
}

async fn run_converter(converter: &str, html: &Path, pdf: &Path) -> Result<()> {
    let mut parts = converter.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| MedlifeError::Export("Converter command is empty".to_string()))?;

    let output = Command::new(program)
        .args(parts)
        .arg(html)
        .arg(pdf)
        .output()
        .await
        .map_err(|e| MedlifeError::Export(format!("failed to run `{}`: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MedlifeError::Export(format!(
            "`{}` exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        ))
        .into());
    }
    tracing::info!("Converted transcript to {}", pdf.display());
    Ok(())
}
