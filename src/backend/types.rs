//! Wire types exchanged with the Medlife API

use crate::chat::Message;
use crate::members::Member;
use serde::{Deserialize, Serialize};

/// Body of `POST /signup`
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub mobile: String,
}

/// Body of `POST /signin`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignInRequest<'a> {
    #[serde(rename = "type")]
    pub channel: &'a str,
    pub identifier: &'a str,
}

/// Body of `POST /verify-login-otp`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    #[serde(rename = "type")]
    pub channel: &'a str,
    pub identifier: &'a str,
    pub otp_code: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyOtpResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    pub otp_code: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsernameResponse {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MembersResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberDetailsResponse {
    pub member: Member,
}

/// Member body of `POST /addmember` and `POST /editmember`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub race: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub a1c: String,
    pub blood_pressure: String,
    pub medicine: String,
    pub bmi: String,
    #[serde(rename = "zip_code")]
    pub zip_code: String,
}

/// A chat session as listed by the backend; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteChat {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatsResponse {
    #[serde(default)]
    pub chats: Option<Vec<RemoteChat>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatsReplaceRequest<'a, T: Serialize> {
    pub chats: &'a [T],
}

#[derive(Debug, Serialize)]
pub(crate) struct TranscriptRequest<'a> {
    pub chat: &'a [Message],
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscriptResponse {
    #[serde(default)]
    pub chat: Vec<Message>,
}

/// Result of `POST /ocr`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OcrResult {
    #[serde(default)]
    pub medicines: Vec<String>,
    #[serde(default)]
    pub full_text: String,
}

impl OcrResult {
    /// Medicines as one comma separated line
    pub fn medicines_line(&self) -> String {
        self.medicines.join(", ")
    }
}

/// File handed to the OCR endpoint
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a file from disk, picking the MIME type from its extension
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mime_type = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
        .to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// Parameters of the AI query endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiQuery {
    pub query: String,
    pub api_key: String,
    pub provider: String,
    pub email: String,
    /// JSON encoded member record
    pub member_data: String,
}
