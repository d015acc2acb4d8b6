//! Chat session data model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Reserved id of the transient "waiting for reply" message
pub const LOADING_MESSAGE_ID: &str = "loading-message";

/// Text of the transient placeholder
pub const LOADING_TEXT: &str = "Analyzing...";

/// Line-break marker embedded in message text
pub const LINE_BREAK: &str = "<br>";

/// Display name of the user's own messages
pub const USER_DISPLAY_NAME: &str = "You";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_id")]
    pub id: String,
    pub sender: Sender,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub text: String,
}

impl Message {
    /// Message from the user
    pub fn user(text: &str) -> Self {
        Self {
            id: new_id(),
            sender: Sender::User,
            display_name: USER_DISPLAY_NAME.to_string(),
            text: normalize_text(text),
        }
    }

    /// Message from the assistant
    pub fn assistant(display_name: &str, text: &str) -> Self {
        Self {
            id: new_id(),
            sender: Sender::Assistant,
            display_name: display_name.to_string(),
            text: normalize_text(text),
        }
    }

    /// The loading placeholder
    pub fn placeholder(display_name: &str) -> Self {
        Self {
            id: LOADING_MESSAGE_ID.to_string(),
            sender: Sender::Assistant,
            display_name: display_name.to_string(),
            text: LOADING_TEXT.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == LOADING_MESSAGE_ID
    }

    /// Text with line-break markers as newlines and markup removed
    pub fn plain_text(&self) -> String {
        markup_to_plain(&self.text)
    }
}

/// A saved conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Empty session with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_session_id(),
            name: name.into(),
            messages: Vec::new(),
        }
    }

    /// Whether the name still follows the `Chat N` pattern
    pub fn has_default_name(&self) -> bool {
        is_default_name(&self.name)
    }
}

fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Fresh opaque session id
pub fn new_session_id() -> String {
    new_id()
}

/// Default session name for the `n`th session
pub fn default_name(n: usize) -> String {
    format!("Chat {}", n)
}

fn default_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Chat\s+\d+$").expect("default name regex is valid"))
}

fn break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("break regex is valid"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

/// `Chat N`, case-insensitive
pub fn is_default_name(name: &str) -> bool {
    default_name_regex().is_match(name)
}

/// Turn literal `\n` sequences and newlines into line-break markers
///
/// # Examples
///
/// ```
/// use medlife::chat::normalize_text;
///
/// assert_eq!(normalize_text("a\\nb\nc"), "a<br>b<br>c");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.replace("\\n", "\n").replace('\n', LINE_BREAK)
}

/// Remove line-break markers and every other tag
pub fn strip_markup(text: &str) -> String {
    let without_breaks = break_regex().replace_all(text, "");
    tag_regex().replace_all(&without_breaks, "").trim().to_string()
}

/// Line-break markers become newlines, other tags are removed
pub fn markup_to_plain(text: &str) -> String {
    let with_newlines = break_regex().replace_all(text, "\n");
    tag_regex().replace_all(&with_newlines, "").to_string()
}

/// Title for an archived session
///
/// Uses the first user message (or the first message when there is none),
/// with markup removed, cut to `max_chars` characters. Falls back to
/// `Chat {fallback_index}` when that leaves nothing.
///
/// # Examples
///
/// ```
/// use medlife::chat::{derive_title, Message};
///
/// let msgs = vec![Message::user("What is a normal<br>A1C level?")];
/// assert_eq!(derive_title(&msgs, 1, 40), "What is a normalA1C level?");
/// assert_eq!(derive_title(&[], 3, 40), "Chat 3");
/// ```
pub fn derive_title(messages: &[Message], fallback_index: usize, max_chars: usize) -> String {
    let source = messages
        .iter()
        .find(|m| m.sender == Sender::User)
        .or_else(|| messages.first())
        .map(|m| m.text.as_str())
        .unwrap_or("");
    let base = strip_markup(source);
    if base.is_empty() {
        default_name(fallback_index)
    } else {
        base.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_pattern() {
        assert!(is_default_name("Chat 1"));
        assert!(is_default_name("chat   12"));
        assert!(!is_default_name("Chat"));
        assert!(!is_default_name("Chat 1 notes"));
        assert!(!is_default_name("My chat 2"));
    }

    #[test]
    fn test_derive_title_prefers_user_message() {
        let msgs = vec![
            Message::assistant("Medlife.ai", "Welcome"),
            Message::user("<b>Hello</b> there"),
        ];
        assert_eq!(derive_title(&msgs, 1, 40), "Hello there");

        let only_ai = vec![Message::assistant("Medlife.ai", "Welcome back")];
        assert_eq!(derive_title(&only_ai, 1, 40), "Welcome back");
    }

    #[test]
    fn test_derive_title_truncates_by_chars() {
        let long = "é".repeat(50);
        let msgs = vec![Message::user(&long)];
        assert_eq!(derive_title(&msgs, 1, 40).chars().count(), 40);
    }

    #[test]
    fn test_derive_title_markup_only_falls_back() {
        let msgs = vec![Message::user("\n")];
        assert_eq!(derive_title(&msgs, 2, 40), "Chat 2");
    }

    #[test]
    fn test_message_wire_shape() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "sender": "ai",
            "name": "Medlife.ai",
            "text": "hi"
        }))
        .unwrap();
        assert_eq!(msg.sender, Sender::Assistant);
        assert!(!msg.id.is_empty());

        let value = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(value["sender"], "user");
        assert_eq!(value["name"], "You");
    }

    #[test]
    fn test_plain_text_restores_newlines() {
        let msg = Message::user("line one\nline <i>two</i>");
        assert_eq!(msg.plain_text(), "line one\nline two");
    }
}
