//! Chat session lifecycle
//!
//! [`ChatSessionManager`] owns the account's session list and the active
//! session. Every mutation writes the local cache first and then pushes the
//! whole list to the backend; a failed push is logged and never rolled back.
//!
//! Sending is split in two so the reply is delivered by session id rather
//! than into whatever session happens to be active when it arrives:
//! [`ChatSessionManager::begin_send`] appends the user message and the
//! placeholder and hands back a [`PendingSend`];
//! [`ChatSessionManager::complete_send`] looks the session up again and
//! does nothing if it was deleted in the meantime.

use super::keys::{KeyPrompt, KeySettings};
use super::session::{default_name, derive_title, ChatSession, Message};
use crate::backend::{AiQuery, Backend, BackendError, BackendResult, RemoteChat};
use crate::config::ChatConfig;
use crate::error::{MedlifeError, Result};
use crate::members::Member;
use crate::storage::AccountRepository;

use std::collections::HashSet;
use std::sync::Arc;

pub const MSG_INVALID_API_KEY: &str = "Please provide a valid API key to continue.";
pub const MSG_QUOTA_EXCEEDED: &str = "Your API key has exceeded its quota.";
pub const MSG_NO_RESPONSE: &str = "Sorry, I couldn't get a response. Please try again.";
pub const MSG_EMPTY_CHAT_NAME: &str = "Chat name cannot be empty";
pub const MSG_EMPTY_TRANSCRIPT: &str = "Start chat first before downloading PDF";

/// A send waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// Session the reply belongs to
    pub session_id: String,
    /// Query to issue
    pub query: AiQuery,
}

/// Result of the synchronous half of a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStart {
    /// Blank input, or a reply is already pending
    Ignored,
    /// No usable key; nothing was appended and no request must be made
    Prompt(KeyPrompt),
    /// User message and placeholder appended
    Pending(PendingSend),
}

/// Result of a complete send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored,
    Prompt(KeyPrompt),
    /// Assistant message appended to the session
    Delivered {
        reply: Message,
        /// The server rejected the key; the key prompt should be shown again
        reprompt: bool,
    },
    /// The session was deleted before the reply arrived
    Discarded,
}

/// Turn an AI query result into the assistant's text
///
/// Returns the text and whether the key prompt should be shown again.
pub fn classify_reply(result: BackendResult<String>) -> (String, bool) {
    match result {
        Ok(text) => (text, false),
        Err(BackendError::Status { body, .. }) => {
            let lower = body.to_lowercase();
            if lower.contains("api key") {
                (MSG_INVALID_API_KEY.to_string(), true)
            } else if lower.contains("quota") {
                (MSG_QUOTA_EXCEEDED.to_string(), false)
            } else {
                (format!("Error from backend: {}", body), false)
            }
        }
        Err(e) => {
            tracing::warn!("AI query failed: {}", e);
            (MSG_NO_RESPONSE.to_string(), false)
        }
    }
}

/// Fill in missing names and ids; a repeated id is replaced by a fresh one
fn normalize_remote(remote: Vec<RemoteChat>) -> Vec<ChatSession> {
    let mut seen = HashSet::new();
    remote
        .into_iter()
        .enumerate()
        .map(|(idx, chat)| {
            let mut session = ChatSession::new(
                chat.name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| default_name(idx + 1)),
            );
            match chat.id.filter(|id| !id.is_empty()) {
                Some(id) if !seen.contains(&id) => session.id = id,
                Some(id) => tracing::warn!("Duplicate chat id {} replaced by {}", id, session.id),
                None => {}
            }
            seen.insert(session.id.clone());
            session.messages = chat.messages.unwrap_or_default();
            session
        })
        .collect()
}

/// Sessions and active conversation of one account
pub struct ChatSessionManager {
    backend: Arc<dyn Backend>,
    repo: AccountRepository,
    keys: KeySettings,
    assistant_name: String,
    title_max_chars: usize,
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
    member: Option<Member>,
    draft: String,
}

impl ChatSessionManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        repo: AccountRepository,
        keys: KeySettings,
        config: &ChatConfig,
    ) -> Self {
        Self {
            backend,
            repo,
            keys,
            assistant_name: config.assistant_name.clone(),
            title_max_chars: config.title_max_chars,
            sessions: Vec::new(),
            active_id: None,
            member: None,
            draft: String::new(),
        }
    }

    /// Load the session list
    ///
    /// Remote list first (cached locally right away), then the local cache.
    /// The first listed session becomes active; when there is none an empty
    /// `Chat 1` is created.
    pub async fn load(&mut self) -> Result<()> {
        match self.backend.list_chats(self.repo.email()).await {
            Ok(remote) => {
                self.sessions = normalize_remote(remote);
                if let Err(e) = self.repo.save_chat_history(&self.sessions) {
                    tracing::warn!("Failed to cache chat history: {}", e);
                }
                tracing::debug!("Loaded {} remote chat sessions", self.sessions.len());
            }
            Err(e) => {
                tracing::warn!("Chat fetch failed, using local history: {}", e);
                self.sessions = match self.repo.chat_history() {
                    Ok(sessions) => sessions.unwrap_or_default(),
                    Err(e) => {
                        tracing::error!("Local chat history unreadable: {}", e);
                        Vec::new()
                    }
                };
            }
        }

        self.draft.clear();
        match self.sessions.first() {
            Some(first) => self.active_id = Some(first.id.clone()),
            None => {
                let fresh = ChatSession::new(default_name(1));
                self.active_id = Some(fresh.id.clone());
                self.sessions.push(fresh);
                self.repo.save_chat_history(&self.sessions)?;
            }
        }
        Ok(())
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active session
    pub fn active(&self) -> Option<&ChatSession> {
        let id = self.active_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Messages of the active session
    pub fn messages(&self) -> &[Message] {
        self.active().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    pub fn set_member(&mut self, member: Option<Member>) {
        self.member = member;
    }

    pub fn keys(&self) -> &KeySettings {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut KeySettings {
        &mut self.keys
    }

    /// Unsent input
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// Write the list locally, then push it to the backend
    ///
    /// # Errors
    ///
    /// Only a local write failure is returned.
    pub async fn persist(&self) -> Result<()> {
        let snapshot: Vec<ChatSession> = self
            .sessions
            .iter()
            .map(|s| ChatSession {
                messages: s
                    .messages
                    .iter()
                    .filter(|m| !m.is_placeholder())
                    .cloned()
                    .collect(),
                ..s.clone()
            })
            .collect();
        self.repo.save_chat_history(&snapshot)?;
        if let Err(e) = self.backend.replace_chats(self.repo.email(), &snapshot).await {
            tracing::warn!("Failed to sync chats: {}", e);
        }
        Ok(())
    }

    /// Synchronous half of a send
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::NoMemberSelected` when no member is set.
    pub async fn begin_send(&mut self, input: &str) -> Result<SendStart> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(SendStart::Ignored);
        }
        let member_data = match &self.member {
            Some(member) => serde_json::to_string(member)?,
            None => return Err(MedlifeError::NoMemberSelected.into()),
        };
        let (provider, api_key) = match self.keys.selected_credential()? {
            Some(credential) => credential,
            None => return Ok(SendStart::Prompt(self.keys.prompt_for_missing_key())),
        };
        if self.messages().iter().any(Message::is_placeholder) {
            tracing::debug!("Ignoring send while a reply is pending");
            return Ok(SendStart::Ignored);
        }

        if self.active().is_none() {
            let fresh = ChatSession::new(default_name(self.sessions.len() + 1));
            self.active_id = Some(fresh.id.clone());
            self.sessions.insert(0, fresh);
            self.persist().await?;
        }
        let session_id = self
            .active_id
            .clone()
            .ok_or_else(|| MedlifeError::SessionNotFound("active".to_string()))?;
        let position = self
            .position(&session_id)
            .ok_or_else(|| MedlifeError::SessionNotFound(session_id.clone()))?;

        let session = &mut self.sessions[position];
        session.messages.push(Message::user(text));
        session.messages.push(Message::placeholder(&self.assistant_name));
        self.draft.clear();

        Ok(SendStart::Pending(PendingSend {
            session_id,
            query: AiQuery {
                query: text.to_string(),
                api_key,
                provider: provider.as_str().to_string(),
                email: self.repo.email().to_string(),
                member_data,
            },
        }))
    }

    /// Deliver the reply of `pending` into its session
    pub async fn complete_send(
        &mut self,
        pending: PendingSend,
        result: BackendResult<String>,
    ) -> Result<SendOutcome> {
        let position = match self.position(&pending.session_id) {
            Some(position) => position,
            None => {
                tracing::info!("Dropping reply for deleted session {}", pending.session_id);
                return Ok(SendOutcome::Discarded);
            }
        };

        let (text, reprompt) = classify_reply(result);
        let reply = Message::assistant(&self.assistant_name, &text);
        let session = &mut self.sessions[position];
        session.messages.retain(|m| !m.is_placeholder());
        session.messages.push(reply.clone());

        self.persist().await?;
        Ok(SendOutcome::Delivered { reply, reprompt })
    }

    /// Send `input` and wait for the reply
    pub async fn send(&mut self, input: &str) -> Result<SendOutcome> {
        match self.begin_send(input).await? {
            SendStart::Ignored => Ok(SendOutcome::Ignored),
            SendStart::Prompt(prompt) => Ok(SendOutcome::Prompt(prompt)),
            SendStart::Pending(pending) => {
                let result = self.backend.ask_ai(&pending.query).await;
                self.complete_send(pending, result).await
            }
        }
    }

    /// Archive the active session and start an empty one
    ///
    /// A non-empty active session still named `Chat N` is renamed after its
    /// first user message.
    pub async fn new_chat(&mut self) -> Result<&ChatSession> {
        let max_chars = self.title_max_chars;
        if let Some(position) = self.active_id.as_deref().and_then(|id| self.position(id)) {
            let session = &mut self.sessions[position];
            if !session.messages.is_empty() && session.has_default_name() {
                session.name = derive_title(&session.messages, position + 1, max_chars);
                tracing::debug!("Archived chat as {:?}", session.name);
            }
        }

        let fresh = ChatSession::new(default_name(self.sessions.len() + 1));
        self.active_id = Some(fresh.id.clone());
        self.sessions.insert(0, fresh);
        self.draft.clear();
        self.persist().await?;
        Ok(&self.sessions[0])
    }

    /// Rename session `id`
    ///
    /// # Errors
    ///
    /// Blank names are a validation error; unknown ids are
    /// `MedlifeError::SessionNotFound`.
    pub async fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MedlifeError::validation("name", MSG_EMPTY_CHAT_NAME).into());
        }
        let position = self
            .position(id)
            .ok_or_else(|| MedlifeError::SessionNotFound(id.to_string()))?;
        self.sessions[position].name = name.to_string();
        self.persist().await
    }

    /// Delete session `id`
    ///
    /// The backend is told best-effort. When the active session goes, the
    /// new first session becomes active.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let position = self
            .position(id)
            .ok_or_else(|| MedlifeError::SessionNotFound(id.to_string()))?;
        let removed = self.sessions.remove(position);

        if let Err(e) = self.backend.delete_chat(self.repo.email(), &removed.id).await {
            tracing::warn!("Failed to delete chat {} remotely: {}", removed.id, e);
        }
        self.persist().await?;

        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
            self.draft.clear();
        }
        Ok(())
    }

    /// Make session `id` active, discarding the draft
    pub fn select(&mut self, id: &str) -> Result<&ChatSession> {
        let position = self
            .position(id)
            .ok_or_else(|| MedlifeError::SessionNotFound(id.to_string()))?;
        self.active_id = Some(id.to_string());
        self.draft.clear();
        Ok(&self.sessions[position])
    }

    /// Store the active session's messages as the member's transcript
    pub async fn save_transcript(&self) -> Result<()> {
        let member = self.member.as_ref().ok_or(MedlifeError::NoMemberSelected)?;
        let messages: Vec<Message> = self
            .messages()
            .iter()
            .filter(|m| !m.is_placeholder())
            .cloned()
            .collect();
        self.backend
            .save_transcript(self.repo.email(), &member.transcript_name(), &messages)
            .await?;
        tracing::info!("Saved transcript for {}", member.full_name());
        Ok(())
    }
}

/// Fetch the stored transcript of `member`
///
/// # Errors
///
/// An empty transcript is a validation error.
pub async fn fetch_transcript(
    backend: &dyn Backend,
    email: &str,
    member: &Member,
) -> Result<Vec<Message>> {
    let messages = backend
        .fetch_transcript(email, &member.transcript_name())
        .await?;
    if messages.is_empty() {
        return Err(MedlifeError::validation("transcript", MSG_EMPTY_TRANSCRIPT).into());
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{KeyPromptStatus, Provider, Sender};
    use crate::test_utils::{chat_manager, member};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_sync(server: &MockServer) {
        Mock::given(method("PUT"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    #[test]
    fn test_classify_reply() {
        let status = |body: &str| BackendError::Status {
            status: 500,
            message: String::new(),
            body: body.to_string(),
        };
        assert_eq!(classify_reply(Ok("hi".into())), ("hi".to_string(), false));
        assert_eq!(
            classify_reply(Err(status("Invalid API key provided"))),
            (MSG_INVALID_API_KEY.to_string(), true)
        );
        assert_eq!(
            classify_reply(Err(status("You exceeded your current quota"))),
            (MSG_QUOTA_EXCEEDED.to_string(), false)
        );
        assert_eq!(
            classify_reply(Err(status("boom"))).0,
            "Error from backend: boom"
        );
        assert_eq!(
            classify_reply(Err(BackendError::Decode("x".into()))).0,
            MSG_NO_RESPONSE
        );
    }

    #[tokio::test]
    async fn test_load_empty_creates_chat_one() {
        let (server, mut manager, repo) = chat_manager().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chats": []})))
            .mount(&server)
            .await;

        manager.load().await.unwrap();
        assert_eq!(manager.sessions().len(), 1);
        assert_eq!(manager.active().unwrap().name, "Chat 1");
        assert_eq!(repo.chat_history().unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_selects_first_remote_and_fills_gaps() {
        let (server, mut manager, repo) = chat_manager().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [
                    {"id": "c1", "messages": [{"sender": "user", "name": "You", "text": "hi"}]},
                    {"name": "Labs"}
                ]
            })))
            .mount(&server)
            .await;

        manager.load().await.unwrap();
        assert_eq!(manager.active_id(), Some("c1"));
        assert_eq!(manager.sessions()[0].name, "Chat 1");
        assert_eq!(manager.messages().len(), 1);
        assert!(!manager.sessions()[1].id.is_empty());
        assert_eq!(repo.chat_history().unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_local_history() {
        let (server, mut manager, repo) = chat_manager().await;
        let mut saved = ChatSession::new("Cholesterol");
        saved.messages.push(Message::user("LDL?"));
        repo.save_chat_history(&[saved.clone()]).unwrap();
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        manager.load().await.unwrap();
        assert_eq!(manager.active_id(), Some(saved.id.as_str()));
        assert_eq!(manager.messages(), saved.messages.as_slice());
    }

    #[tokio::test]
    async fn test_load_gives_repeated_remote_ids_fresh_ids() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [
                    {"id": "x", "name": "A", "messages": []},
                    {"id": "x", "name": "B", "messages": []}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/chats/x"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        manager.load().await.unwrap();
        let ids: Vec<&str> = manager.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids[0], "x");
        assert_ne!(ids[1], "x");
        assert_eq!(manager.sessions()[1].name, "B");

        manager.delete("x").await.unwrap();
        assert_eq!(manager.sessions().len(), 1);
        let remaining = manager.sessions()[0].id.clone();
        assert_ne!(remaining, "x");
        assert_eq!(manager.active_id(), Some(remaining.as_str()));
    }

    #[tokio::test]
    async fn test_send_without_key_prompts_without_request() {
        let (server, mut manager, _repo) = chat_manager().await;
        Mock::given(method("GET"))
            .and(path("/ask_ai/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
            .expect(0)
            .mount(&server)
            .await;
        manager.set_member(Some(member("Jane", "Doe", 1)));

        let outcome = manager.send("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Prompt(KeyPrompt::FirstRun));

        manager.keys_mut().dismiss_prompt().unwrap();
        assert_eq!(manager.keys().status(), KeyPromptStatus::Dismissed);
        let outcome = manager.send("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Prompt(KeyPrompt::Warning));
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_requires_member() {
        let (_server, mut manager, _repo) = chat_manager().await;
        manager.keys_mut().set_key(Provider::OpenAi, "sk").unwrap();
        let err = manager.send("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a family member first");
        assert_eq!(manager.send("   ").await.unwrap(), SendOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_begin_send_settles_preconditions_without_request() {
        let (server, mut manager, _repo) = chat_manager().await;
        Mock::given(method("GET"))
            .and(path("/ask_ai/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(manager.begin_send("  ").await.unwrap(), SendStart::Ignored);
        manager.set_member(Some(member("Jane", "Doe", 1)));
        assert_eq!(
            manager.begin_send("hello").await.unwrap(),
            SendStart::Prompt(KeyPrompt::FirstRun)
        );
        manager.set_member(None);
        manager.keys_mut().set_key(Provider::OpenAi, "sk").unwrap();
        assert!(manager.begin_send("hello").await.is_err());
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn test_begin_send_appends_user_message_and_placeholder() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        manager.keys_mut().set_key(Provider::Gemini, "g-key").unwrap();
        manager.set_member(Some(member("Jane", "Doe", 1)));
        manager.set_draft("hello");

        let pending = match manager.begin_send("hello").await.unwrap() {
            SendStart::Pending(p) => p,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(pending.query.provider, "gemini");
        assert_eq!(pending.query.api_key, "g-key");
        assert!(pending.query.member_data.contains("\"firstName\":\"Jane\""));
        assert_eq!(manager.draft(), "");

        let msgs = manager.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].sender, Sender::User);
        assert_eq!(msgs[0].text, "hello");
        assert!(msgs[1].is_placeholder());

        assert_eq!(
            manager.begin_send("again").await.unwrap(),
            SendStart::Ignored
        );

        manager
            .complete_send(pending, Ok("hi there".to_string()))
            .await
            .unwrap();
        let msgs = manager.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].text, "hi there");
        assert_eq!(msgs[1].display_name, "Medlife.ai");
    }

    #[tokio::test]
    async fn test_reply_goes_to_original_session() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        manager.keys_mut().set_key(Provider::OpenAi, "sk").unwrap();
        manager.set_member(Some(member("Jane", "Doe", 1)));

        let pending = match manager.begin_send("first question").await.unwrap() {
            SendStart::Pending(p) => p,
            other => panic!("unexpected {:?}", other),
        };
        let original = pending.session_id.clone();
        manager.new_chat().await.unwrap();

        manager
            .complete_send(pending, Ok("answer".to_string()))
            .await
            .unwrap();
        assert!(manager.messages().is_empty());
        let archived = manager
            .sessions()
            .iter()
            .find(|s| s.id == original)
            .unwrap();
        assert_eq!(archived.messages.last().unwrap().text, "answer");
        assert!(!archived.messages.iter().any(Message::is_placeholder));
    }

    #[tokio::test]
    async fn test_reply_for_deleted_session_is_discarded() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        manager.keys_mut().set_key(Provider::OpenAi, "sk").unwrap();
        manager.set_member(Some(member("Jane", "Doe", 1)));

        let pending = match manager.begin_send("question").await.unwrap() {
            SendStart::Pending(p) => p,
            other => panic!("unexpected {:?}", other),
        };
        let id = pending.session_id.clone();
        manager.delete(&id).await.unwrap();

        let outcome = manager
            .complete_send(pending, Ok("late".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Discarded);
    }

    #[tokio::test]
    async fn test_new_chat_renames_default_named_session() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [{"id": "c1", "name": "Chat 1", "messages": [
                    {"sender": "user", "name": "You",
                     "text": "What should my<br>blood sugar be after eating a full meal?"}
                ]}]
            })))
            .mount(&server)
            .await;
        manager.load().await.unwrap();

        let fresh = manager.new_chat().await.unwrap().clone();
        assert_eq!(fresh.name, "Chat 2");
        assert!(fresh.messages.is_empty());
        assert_eq!(manager.active_id(), Some(fresh.id.as_str()));
        assert_eq!(
            manager.sessions()[1].name,
            "What should myblood sugar be after eatin"
        );
    }

    #[tokio::test]
    async fn test_new_chat_keeps_custom_name() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [{"id": "c1", "name": "Insulin", "messages": [
                    {"sender": "user", "name": "You", "text": "dose?"}
                ]}]
            })))
            .mount(&server)
            .await;
        manager.load().await.unwrap();
        manager.new_chat().await.unwrap();
        assert_eq!(manager.sessions()[1].name, "Insulin");
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_and_persists() {
        let (server, mut manager, repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chats": []})))
            .mount(&server)
            .await;
        manager.load().await.unwrap();
        let id = manager.active_id().unwrap().to_string();

        let err = manager.rename(&id, "   ").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_EMPTY_CHAT_NAME);

        manager.rename(&id, "  Diet  ").await.unwrap();
        assert_eq!(manager.active().unwrap().name, "Diet");
        assert_eq!(repo.chat_history().unwrap().unwrap()[0].name, "Diet");
    }

    #[tokio::test]
    async fn test_delete_active_selects_first_remaining() {
        let (server, mut manager, repo) = chat_manager().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [
                    {"id": "a", "name": "A", "messages": []},
                    {"id": "b", "name": "B", "messages": [{"sender": "ai", "name": "Medlife.ai", "text": "x"}]},
                    {"id": "c", "name": "C", "messages": []}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/chats/a"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        manager.load().await.unwrap();

        manager.delete("a").await.unwrap();
        assert_eq!(manager.active_id(), Some("b"));
        assert_eq!(manager.messages()[0].text, "x");
        assert_eq!(repo.chat_history().unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_last_session_clears_active() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chats": []})))
            .mount(&server)
            .await;
        manager.load().await.unwrap();
        let id = manager.active_id().unwrap().to_string();
        manager.delete(&id).await.unwrap();
        assert_eq!(manager.active_id(), None);
        assert!(manager.messages().is_empty());
    }

    #[tokio::test]
    async fn test_select_discards_draft() {
        let (server, mut manager, _repo) = chat_manager().await;
        mount_sync(&server).await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chats": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]
            })))
            .mount(&server)
            .await;
        manager.load().await.unwrap();
        manager.set_draft("half typed");
        manager.select("b").unwrap();
        assert_eq!(manager.draft(), "");
        assert!(manager.select("zzz").is_err());
    }

    #[tokio::test]
    async fn test_save_transcript_uses_member_name() {
        let (server, mut manager, _repo) = chat_manager().await;
        Mock::given(method("POST"))
            .and(path("/saveChat/"))
            .and(wiremock::matchers::query_param("member_name", "Jane_Doe"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        assert!(manager.save_transcript().await.is_err());
        manager.set_member(Some(member("Jane", "Doe", 1)));
        manager.save_transcript().await.unwrap();
    }
}
