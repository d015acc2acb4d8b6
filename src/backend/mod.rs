//! Medlife API client
//!
//! [`Backend`] is the seam between the client core and the remote service.
//! [`HttpBackend`] implements it over `reqwest`; tests substitute a
//! `wiremock` server behind the same implementation.
//!
//! The backend is the source of truth for members and chats. Nothing here
//! retries: every failure is returned to the caller as a [`BackendError`].

use crate::chat::{ChatSession, Message};
use crate::config::BackendConfig;
use crate::error::{MedlifeError, Result};
use crate::members::Member;
use crate::validation::LoginChannel;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub mod types;

pub use types::{AiQuery, MemberPayload, OcrResult, RemoteChat, SignUpRequest, UploadFile};

use types::*;

/// Errors returned by backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    /// The request never produced an HTTP response
    #[error("Network error. Please check your connection. ({0})")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Human readable reason extracted from the body
        message: String,
        /// Raw response body
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid response format from server: {0}")]
    Decode(String),
}

impl BackendError {
    /// HTTP status for server-declared errors
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Extract a readable reason from an error response body
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}`,
/// `{"detail": {"message": "..."}}` and `{"message": "..."}`. Plain-text
/// bodies are returned as-is; empty bodies fall back to the status code.
///
/// # Examples
///
/// ```
/// use medlife::backend::extract_error_message;
///
/// assert_eq!(
///     extract_error_message(400, r#"{"detail":[{"msg":"a"},{"msg":"b"}]}"#),
///     "a, b"
/// );
/// assert_eq!(extract_error_message(502, ""), "Server error: 502");
/// ```
pub fn extract_error_message(status: u16, body: &str) -> String {
    let fallback = format!("Server error: {}", status);
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = body.trim();
            return if trimmed.is_empty() {
                fallback
            } else {
                trimmed.to_string()
            };
        }
    };

    if let Some(detail) = value.get("detail") {
        match detail {
            serde_json::Value::String(s) => return s.clone(),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            serde_json::Value::Object(obj) => {
                if let Some(msg) = obj.get("message").and_then(|m| m.as_str()) {
                    return msg.to_string();
                }
            }
            _ => {}
        }
    }

    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// Remote collaborator used by the client core
#[async_trait]
pub trait Backend: Send + Sync {
    /// Register a new account
    async fn sign_up(&self, request: &SignUpRequest) -> BackendResult<()>;

    /// Ask the server to send a login OTP
    async fn request_login_otp(&self, channel: LoginChannel, identifier: &str) -> BackendResult<()>;

    /// Exchange an OTP for an access token
    async fn verify_login_otp(
        &self,
        channel: LoginChannel,
        identifier: &str,
        otp: &str,
    ) -> BackendResult<String>;

    /// Start a password reset
    async fn forgot_password(&self, email: &str) -> BackendResult<()>;

    /// Complete a password reset
    async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> BackendResult<()>;

    /// Display name of the account
    async fn username(&self, email: &str) -> BackendResult<Option<String>>;

    /// Members of the account, in backend order
    async fn list_members(&self, email: &str) -> BackendResult<Vec<Member>>;

    async fn add_member(&self, payload: &MemberPayload) -> BackendResult<()>;

    async fn edit_member(&self, member_index: u32, payload: &MemberPayload) -> BackendResult<()>;

    async fn delete_member(&self, email: &str, member_index: u32) -> BackendResult<()>;

    async fn member_details(&self, email: &str, member_index: u32) -> BackendResult<Member>;

    /// Chat sessions saved for the account
    async fn list_chats(&self, email: &str) -> BackendResult<Vec<RemoteChat>>;

    /// Replace the whole saved chat list
    async fn replace_chats(&self, email: &str, chats: &[ChatSession]) -> BackendResult<()>;

    async fn delete_chat(&self, email: &str, chat_id: &str) -> BackendResult<()>;

    /// Store a member's transcript
    async fn save_transcript(
        &self,
        email: &str,
        member_name: &str,
        messages: &[Message],
    ) -> BackendResult<()>;

    /// Fetch a member's stored transcript
    async fn fetch_transcript(&self, email: &str, member_name: &str) -> BackendResult<Vec<Message>>;

    /// Extract medicines from a prescription photo or document
    async fn extract_prescription(&self, file: UploadFile) -> BackendResult<OcrResult>;

    /// Ask the AI assistant; returns the plain-text answer
    async fn ask_ai(&self, query: &AiQuery) -> BackendResult<String>;
}

/// `reqwest` implementation of [`Backend`]
///
/// # Examples
///
/// ```no_run
/// use medlife::backend::{Backend, HttpBackend};
/// use medlife::config::BackendConfig;
///
/// # async fn example() -> medlife::error::Result<()> {
/// let backend = HttpBackend::new(&BackendConfig::default())?;
/// let members = backend.list_members("jane@example.com").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the configured base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MedlifeError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(status.as_u16(), &body);
        tracing::debug!("Backend returned {}: {}", status, message);
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_up(&self, request: &SignUpRequest) -> BackendResult<()> {
        let response = self.client.post(self.url("/signup")).json(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn request_login_otp(&self, channel: LoginChannel, identifier: &str) -> BackendResult<()> {
        let body = SignInRequest {
            channel: channel.as_str(),
            identifier,
        };
        let response = self.client.post(self.url("/signin")).json(&body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn verify_login_otp(
        &self,
        channel: LoginChannel,
        identifier: &str,
        otp: &str,
    ) -> BackendResult<String> {
        let body = VerifyOtpRequest {
            channel: channel.as_str(),
            identifier,
            otp_code: otp,
        };
        let response = self
            .client
            .post(self.url("/verify-login-otp"))
            .json(&body)
            .send()
            .await?;
        let parsed: VerifyOtpResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.access_token)
    }

    async fn forgot_password(&self, email: &str) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/forgot-password"))
            .json(&ForgotPasswordRequest { email })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn reset_password(&self, email: &str, otp: &str, new_password: &str) -> BackendResult<()> {
        let body = ResetPasswordRequest {
            email,
            otp_code: otp,
            new_password,
        };
        let response = self
            .client
            .post(self.url("/reset-password"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn username(&self, email: &str) -> BackendResult<Option<String>> {
        let response = self
            .client
            .get(self.url("/get-username"))
            .query(&[("email", email)])
            .send()
            .await?;
        let parsed: UsernameResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.username)
    }

    async fn list_members(&self, email: &str) -> BackendResult<Vec<Member>> {
        let response = self
            .client
            .get(self.url("/getmember"))
            .query(&[("email", email)])
            .send()
            .await?;
        let parsed: MembersResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.members)
    }

    async fn add_member(&self, payload: &MemberPayload) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/addmember"))
            .json(payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn edit_member(&self, member_index: u32, payload: &MemberPayload) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/editmember"))
            .query(&[("member_index", member_index.to_string())])
            .json(payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_member(&self, email: &str, member_index: u32) -> BackendResult<()> {
        let index = member_index.to_string();
        let response = self
            .client
            .delete(self.url("/deletemember"))
            .query(&[("email", email), ("member_index", index.as_str())])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn member_details(&self, email: &str, member_index: u32) -> BackendResult<Member> {
        let mut url = url::Url::parse(&self.url("/member-details"))
            .map_err(|e| BackendError::Decode(format!("Invalid member URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Decode("Base URL cannot carry a path".to_string()))?
            .push(email)
            .push(&member_index.to_string());
        let response = self.client.get(url).send().await?;
        let parsed: MemberDetailsResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.member)
    }

    async fn list_chats(&self, email: &str) -> BackendResult<Vec<RemoteChat>> {
        let response = self
            .client
            .get(self.url("/chats"))
            .query(&[("email", email)])
            .send()
            .await?;
        let parsed: ChatsResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.chats.unwrap_or_default())
    }

    async fn replace_chats(&self, email: &str, chats: &[ChatSession]) -> BackendResult<()> {
        let response = self
            .client
            .put(self.url("/chats"))
            .query(&[("email", email)])
            .json(&ChatsReplaceRequest { chats })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_chat(&self, email: &str, chat_id: &str) -> BackendResult<()> {
        let mut url = url::Url::parse(&self.url("/chats"))
            .map_err(|e| BackendError::Decode(format!("Invalid chat URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Decode("Base URL cannot carry a path".to_string()))?
            .push(chat_id);
        let response = self
            .client
            .delete(url)
            .query(&[("email", email)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn save_transcript(
        &self,
        email: &str,
        member_name: &str,
        messages: &[Message],
    ) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/saveChat/"))
            .query(&[("email", email), ("member_name", member_name)])
            .json(&TranscriptRequest { chat: messages })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_transcript(&self, email: &str, member_name: &str) -> BackendResult<Vec<Message>> {
        let response = self
            .client
            .get(self.url("/fetchChat/"))
            .query(&[("email", email), ("member_name", member_name)])
            .send()
            .await?;
        let parsed: TranscriptResponse = Self::decode(Self::check(response).await?).await?;
        Ok(parsed.chat)
    }

    async fn extract_prescription(&self, file: UploadFile) -> BackendResult<OcrResult> {
        tracing::debug!(
            "Uploading {} ({}, {} bytes) for OCR",
            file.file_name,
            file.mime_type,
            file.bytes.len()
        );
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/ocr"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    async fn ask_ai(&self, query: &AiQuery) -> BackendResult<String> {
        let response = self
            .client
            .get(self.url("/ask_ai/"))
            .query(&[
                ("query", query.query.as_str()),
                ("api_key", query.api_key.as_str()),
                ("provider", query.provider.as_str()),
                ("email", query.email.as_str()),
                ("member_data", query.member_data.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.text().await?)
    }
}
