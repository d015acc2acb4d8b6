//! Typed access to the local store
//!
//! One method per logical entity. Callers never build key strings or touch
//! JSON directly.

use super::types::{LoginMarkers, StorageKey};
use super::KeyValueStore;
use crate::chat::{ChatSession, KeyPromptStatus, Provider};
use crate::error::{MedlifeError, Result};
use crate::members::Member;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|e| {
                MedlifeError::Storage(format!("Corrupt value for {}: {}", key, e))
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| MedlifeError::Storage(format!("Serialization failed: {}", e)))?;
    store.set(key, &raw)
}

/// Device-wide repository
#[derive(Clone)]
pub struct LocalRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LocalRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(&self, key: StorageKey) -> String {
        key.format("")
    }

    /// Read the persisted login markers
    ///
    /// # Errors
    ///
    /// Returns a storage error when the login timestamp is not a number.
    pub fn login_markers(&self) -> Result<LoginMarkers> {
        let logged_in = self.store.get(&self.key(StorageKey::IsLoggedIn))?;
        let access_token = self.store.get(&self.key(StorageKey::AccessToken))?;
        let login_time = self.store.get(&self.key(StorageKey::LoginTime))?;
        let email = self.store.get(&self.key(StorageKey::UserEmail))?;

        let login_time_ms = match login_time {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| {
                MedlifeError::Storage(format!("Invalid login timestamp {:?}: {}", raw, e))
            })?),
            None => None,
        };

        Ok(LoginMarkers {
            logged_in: logged_in.as_deref() == Some("true"),
            access_token,
            login_time_ms,
            email,
        })
    }

    /// Persist a successful login
    pub fn record_login(&self, email: &str, access_token: &str, at: DateTime<Utc>) -> Result<()> {
        self.store.set(&self.key(StorageKey::UserEmail), email)?;
        self.store.set(&self.key(StorageKey::AccessToken), access_token)?;
        self.store.set(&self.key(StorageKey::IsLoggedIn), "true")?;
        self.store.set(
            &self.key(StorageKey::LoginTime),
            &at.timestamp_millis().to_string(),
        )
    }

    /// Forget the login markers and the signed-in email
    pub fn clear_login(&self) -> Result<()> {
        for key in [
            StorageKey::UserEmail,
            StorageKey::AccessToken,
            StorageKey::IsLoggedIn,
            StorageKey::LoginTime,
        ] {
            self.store.remove(&self.key(key))?;
        }
        Ok(())
    }

    /// Email of the signed-in account
    pub fn current_email(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&self.key(StorageKey::UserEmail))?
            .filter(|e| !e.is_empty()))
    }

    /// Email of the account currently resetting its password
    pub fn reset_email(&self) -> Result<Option<String>> {
        self.store.get(&self.key(StorageKey::ResetEmail))
    }

    pub fn set_reset_email(&self, email: &str) -> Result<()> {
        self.store.set(&self.key(StorageKey::ResetEmail), email)
    }

    pub fn clear_reset_email(&self) -> Result<()> {
        self.store.remove(&self.key(StorageKey::ResetEmail))
    }

    /// Erase everything on the device
    pub fn wipe(&self) -> Result<()> {
        tracing::info!("Wiping local store");
        self.store.clear()
    }

    /// Repository scoped to one account
    pub fn account(&self, email: &str) -> AccountRepository {
        AccountRepository {
            store: Arc::clone(&self.store),
            email: email.to_string(),
        }
    }
}

/// Repository for the data of a single account
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn KeyValueStore>,
    email: String,
}

impl AccountRepository {
    /// Account email the repository is scoped to
    pub fn email(&self) -> &str {
        &self.email
    }

    fn key(&self, key: StorageKey) -> String {
        key.format(&self.email)
    }

    /// Last fetched member snapshot
    pub fn members(&self) -> Result<Option<Vec<Member>>> {
        read_json(self.store.as_ref(), &self.key(StorageKey::MembersList))
    }

    pub fn save_members(&self, members: &[Member]) -> Result<()> {
        write_json(self.store.as_ref(), &self.key(StorageKey::MembersList), members)
    }

    /// Locally mirrored chat sessions
    pub fn chat_history(&self) -> Result<Option<Vec<ChatSession>>> {
        read_json(self.store.as_ref(), &self.key(StorageKey::ChatHistory))
    }

    pub fn save_chat_history(&self, sessions: &[ChatSession]) -> Result<()> {
        write_json(self.store.as_ref(), &self.key(StorageKey::ChatHistory), sessions)
    }

    /// Stored API key for `provider`; blank values read as missing
    pub fn api_key(&self, provider: Provider) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&self.key(StorageKey::ApiKey(provider.as_str().to_string())))?
            .filter(|k| !k.trim().is_empty()))
    }

    pub fn set_api_key(&self, provider: Provider, key: &str) -> Result<()> {
        self.store.set(
            &self.key(StorageKey::ApiKey(provider.as_str().to_string())),
            key,
        )
    }

    pub fn remove_api_key(&self, provider: Provider) -> Result<()> {
        self.store
            .remove(&self.key(StorageKey::ApiKey(provider.as_str().to_string())))
    }

    /// Provider chosen for AI queries; unknown names read as missing
    pub fn selected_provider(&self) -> Result<Option<Provider>> {
        Ok(self
            .store
            .get(&self.key(StorageKey::SelectedProvider))?
            .and_then(|name| name.parse().ok()))
    }

    pub fn set_selected_provider(&self, provider: Option<Provider>) -> Result<()> {
        let key = self.key(StorageKey::SelectedProvider);
        match provider {
            Some(p) => self.store.set(&key, p.as_str()),
            None => self.store.remove(&key),
        }
    }

    pub fn key_prompt_status(&self) -> Result<Option<KeyPromptStatus>> {
        read_json(self.store.as_ref(), &self.key(StorageKey::KeyPromptStatus))
    }

    pub fn set_key_prompt_status(&self, status: KeyPromptStatus) -> Result<()> {
        write_json(self.store.as_ref(), &self.key(StorageKey::KeyPromptStatus), &status)
    }

    /// Member the chat screen was last opened for
    pub fn current_member(&self) -> Result<Option<Member>> {
        read_json(self.store.as_ref(), &self.key(StorageKey::CurrentMember))
    }

    pub fn set_current_member(&self, member: &Member) -> Result<()> {
        write_json(self.store.as_ref(), &self.key(StorageKey::CurrentMember), member)
    }

    pub fn clear_current_member(&self) -> Result<()> {
        self.store.remove(&self.key(StorageKey::CurrentMember))
    }
}
