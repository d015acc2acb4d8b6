/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`     - start routing, sign-up, login, password reset, logout
- `members`  - member registry
- `keys`     - provider keys and selection
- `chat`     - interactive chat loop
- `history`  - saved chat sessions
- `export`   - transcript export

Every handler works on an [`AppContext`] holding the configuration, the
local repository and the backend client.
*/

use crate::auth::{AuthService, SessionGuard};
use crate::backend::{Backend, HttpBackend};
use crate::chat::{ChatSessionManager, KeySettings};
use crate::config::Config;
use crate::credentials::{credential_store, CredentialStore};
use crate::error::{MedlifeError, Result};
use crate::members::{Member, MemberRegistry};
use crate::storage::{KeyValueStore, LocalRepository, MemoryStore, SledStore};

use chrono::Utc;
use std::sync::Arc;

pub mod auth;
pub mod chat;
pub mod export;
pub mod history;
pub mod keys;
pub mod members;
pub mod special_commands;

/// Shared state of one CLI invocation
pub struct AppContext {
    pub config: Config,
    pub repo: LocalRepository,
    pub backend: Arc<dyn Backend>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppContext {
    /// Open the configured store and backend
    ///
    /// With `ephemeral` the store lives in memory for this run only.
    pub fn new(config: Config, ephemeral: bool) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = if ephemeral {
            tracing::debug!("Using in-memory store");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(SledStore::open(config.storage.resolve_path()?)?)
        };
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.backend)?);
        Ok(Self::with_parts(config, store, backend))
    }

    /// Build a context from explicit parts
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let repo = LocalRepository::new(store);
        let credentials = credential_store(config.credentials.backend, repo.clone());
        Self {
            config,
            repo,
            backend,
            credentials,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(Arc::clone(&self.backend), self.repo.clone())
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(
            self.repo.clone(),
            Arc::clone(&self.backend),
            self.config.session.clone(),
        )
    }

    /// Email of a signed-in account with an unexpired session
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::NotLoggedIn` otherwise.
    pub fn require_email(&self) -> Result<String> {
        let ttl = self.config.session.ttl()?;
        let markers = self.repo.login_markers()?;
        match markers.email.clone() {
            Some(email) if markers.is_valid_at(Utc::now(), ttl) => Ok(email),
            _ => Err(MedlifeError::NotLoggedIn.into()),
        }
    }

    pub fn members(&self, email: &str) -> MemberRegistry {
        MemberRegistry::new(Arc::clone(&self.backend), self.repo.account(email))
            .with_max_members(self.config.members.max_members)
    }

    pub fn key_settings(&self, email: &str) -> Result<KeySettings> {
        KeySettings::load(Arc::clone(&self.credentials), self.repo.account(email))
    }

    /// Chat manager for `email`, not yet loaded
    pub fn chat_manager(&self, email: &str) -> Result<ChatSessionManager> {
        Ok(ChatSessionManager::new(
            Arc::clone(&self.backend),
            self.repo.account(email),
            self.key_settings(email)?,
            &self.config.chat,
        ))
    }

    /// Member `index` when given, else the member chat was last opened for
    pub async fn resolve_member(&self, email: &str, index: Option<u32>) -> Result<Option<Member>> {
        match index {
            Some(index) => Ok(Some(self.members(email).details(index).await?)),
            None => Ok(self.repo.account(email).current_member().unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable current member: {}", e);
                None
            })),
        }
    }
}
