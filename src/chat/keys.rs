//! Provider selection and the API key prompt

use super::provider::Provider;
use crate::credentials::CredentialStore;
use crate::error::{MedlifeError, Result};
use crate::storage::AccountRepository;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persisted state of the "add an API key" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPromptStatus {
    /// No key stored; the first-run prompt should be shown
    #[default]
    PromptPending,
    /// No key stored; the user closed the prompt without adding one
    Dismissed,
    /// At least one key is stored
    HasKeys,
}

/// What to show when a send needs a key that is not there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrompt {
    /// First-run prompt asking for a key
    FirstRun,
    /// Warning pointing at the settings, after the prompt was dismissed
    Warning,
}

impl KeyPrompt {
    pub fn message(&self) -> &'static str {
        match self {
            KeyPrompt::FirstRun => {
                "Add an API key for one of the providers (openai, gemini, claude, mistral) to start chatting."
            }
            KeyPrompt::Warning => "Please enter an API key in settings, then choose a provider.",
        }
    }
}

/// Keys, selected provider and prompt status of one account
pub struct KeySettings {
    credentials: Arc<dyn CredentialStore>,
    repo: AccountRepository,
    status: KeyPromptStatus,
    selected: Option<Provider>,
}

impl KeySettings {
    /// Load settings and reconcile them with the stored keys
    ///
    /// A stored key always means [`KeyPromptStatus::HasKeys`]. The selection
    /// is kept when its key exists, otherwise replaced by the first provider
    /// holding a key, otherwise cleared.
    pub fn load(credentials: Arc<dyn CredentialStore>, repo: AccountRepository) -> Result<Self> {
        let status = repo.key_prompt_status().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable key prompt status: {}", e);
            None
        });
        let mut settings = Self {
            credentials,
            status: status.unwrap_or_default(),
            selected: repo.selected_provider()?,
            repo,
        };
        settings.reconcile()?;
        Ok(settings)
    }

    fn reconcile(&mut self) -> Result<()> {
        let available = self.available()?;
        if available.is_empty() {
            if self.status == KeyPromptStatus::HasKeys {
                self.status = KeyPromptStatus::PromptPending;
            }
        } else {
            self.status = KeyPromptStatus::HasKeys;
        }
        self.repo.set_key_prompt_status(self.status)?;

        let keep = self.selected.filter(|p| available.contains(p));
        let selected = keep.or_else(|| available.first().copied());
        if selected != self.selected {
            tracing::debug!("Selected provider changed to {:?}", selected);
        }
        self.selected = selected;
        self.repo.set_selected_provider(selected)
    }

    pub fn status(&self) -> KeyPromptStatus {
        self.status
    }

    pub fn selected(&self) -> Option<Provider> {
        self.selected
    }

    /// Providers with a stored key, in selection order
    pub fn available(&self) -> Result<Vec<Provider>> {
        let mut available = Vec::new();
        for provider in Provider::ALL {
            if self.credentials.get(self.repo.email(), provider)?.is_some() {
                available.push(provider);
            }
        }
        Ok(available)
    }

    /// Stored key for `provider`
    pub fn key(&self, provider: Provider) -> Result<Option<String>> {
        self.credentials.get(self.repo.email(), provider)
    }

    /// Selected provider together with its key, if both exist
    pub fn selected_credential(&self) -> Result<Option<(Provider, String)>> {
        match self.selected {
            Some(provider) => Ok(self.key(provider)?.map(|key| (provider, key))),
            None => Ok(None),
        }
    }

    /// Store several keys at once; blank keys remove the entry
    pub fn save_keys(&mut self, keys: &[(Provider, String)]) -> Result<()> {
        for (provider, key) in keys {
            self.credentials.set(self.repo.email(), *provider, key)?;
        }
        tracing::info!("Saved API keys for {} provider(s)", keys.len());
        self.reconcile()
    }

    pub fn set_key(&mut self, provider: Provider, key: &str) -> Result<()> {
        self.save_keys(&[(provider, key.to_string())])
    }

    /// Make `provider` the one used for queries
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::Credentials` when no key is stored for it.
    pub fn select_provider(&mut self, provider: Provider) -> Result<()> {
        if self.key(provider)?.is_none() {
            return Err(MedlifeError::Credentials(format!(
                "No API key stored for {}",
                provider
            ))
            .into());
        }
        self.selected = Some(provider);
        self.repo.set_selected_provider(Some(provider))
    }

    /// Record that the prompt was closed without adding a key
    pub fn dismiss_prompt(&mut self) -> Result<()> {
        if self.status != KeyPromptStatus::HasKeys {
            self.status = KeyPromptStatus::Dismissed;
            self.repo.set_key_prompt_status(self.status)?;
        }
        Ok(())
    }

    /// Prompt to show when a send finds no usable key
    pub fn prompt_for_missing_key(&self) -> KeyPrompt {
        match self.status {
            KeyPromptStatus::Dismissed => KeyPrompt::Warning,
            _ => KeyPrompt::FirstRun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::LocalCredentials;
    use crate::storage::{LocalRepository, MemoryStore};

    fn settings() -> (LocalRepository, KeySettings) {
        let repo = LocalRepository::new(Arc::new(MemoryStore::new()));
        let creds = Arc::new(LocalCredentials::new(repo.clone()));
        let settings = KeySettings::load(creds, repo.account("a@example.com")).unwrap();
        (repo, settings)
    }

    #[test]
    fn test_fresh_account_prompts() {
        let (_, settings) = settings();
        assert_eq!(settings.status(), KeyPromptStatus::PromptPending);
        assert_eq!(settings.selected(), None);
        assert_eq!(settings.prompt_for_missing_key(), KeyPrompt::FirstRun);
    }

    #[test]
    fn test_dismiss_turns_prompt_into_warning() {
        let (repo, mut settings) = settings();
        settings.dismiss_prompt().unwrap();
        assert_eq!(settings.prompt_for_missing_key(), KeyPrompt::Warning);
        assert_eq!(
            repo.account("a@example.com").key_prompt_status().unwrap(),
            Some(KeyPromptStatus::Dismissed)
        );
    }

    #[test]
    fn test_saving_key_selects_first_available() {
        let (_, mut settings) = settings();
        settings
            .save_keys(&[
                (Provider::Mistral, "m-key".to_string()),
                (Provider::Gemini, "g-key".to_string()),
            ])
            .unwrap();
        assert_eq!(settings.status(), KeyPromptStatus::HasKeys);
        assert_eq!(settings.selected(), Some(Provider::Gemini));
        assert_eq!(
            settings.selected_credential().unwrap(),
            Some((Provider::Gemini, "g-key".to_string()))
        );
    }

    #[test]
    fn test_select_requires_key() {
        let (_, mut settings) = settings();
        settings.set_key(Provider::OpenAi, "sk").unwrap();
        assert!(settings.select_provider(Provider::Claude).is_err());
        assert_eq!(settings.selected(), Some(Provider::OpenAi));
    }

    #[test]
    fn test_removing_last_key_clears_selection() {
        let (_, mut settings) = settings();
        settings.set_key(Provider::Claude, "c").unwrap();
        settings.set_key(Provider::Claude, "").unwrap();
        assert_eq!(settings.selected(), None);
        assert_eq!(settings.status(), KeyPromptStatus::PromptPending);
    }

    #[test]
    fn test_stale_selection_replaced_on_load() {
        let repo = LocalRepository::new(Arc::new(MemoryStore::new()));
        let account = repo.account("a@example.com");
        account.set_selected_provider(Some(Provider::Claude)).unwrap();
        account.set_api_key(Provider::Mistral, "m").unwrap();

        let creds = Arc::new(LocalCredentials::new(repo.clone()));
        let settings = KeySettings::load(creds, account.clone()).unwrap();
        assert_eq!(settings.selected(), Some(Provider::Mistral));
        assert_eq!(account.selected_provider().unwrap(), Some(Provider::Mistral));
    }
}
