//! Chat sessions with the AI assistant
//!
//! - [`session`]: messages, sessions and title derivation
//! - [`provider`]: AI providers
//! - [`keys`]: provider selection and the key prompt state
//! - [`manager`]: session lifecycle and sending
//! - [`export`]: HTML transcripts

pub mod export;
pub mod keys;
pub mod manager;
pub mod provider;
pub mod session;

pub use export::{render_transcript_html, transcript_file_stem, ExportedTranscript, TranscriptExporter};
pub use keys::{KeyPrompt, KeyPromptStatus, KeySettings};
pub use manager::{
    classify_reply, fetch_transcript, ChatSessionManager, PendingSend, SendOutcome, SendStart,
};
pub use provider::Provider;
pub use session::{
    default_name, derive_title, is_default_name, normalize_text, strip_markup, ChatSession,
    Message, Sender, LOADING_MESSAGE_ID,
};
