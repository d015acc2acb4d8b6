//! Per-provider API key vault
//!
//! Keys are scoped to an account email and a [`Provider`]. They are only
//! ever sent to the backend as a parameter of an AI query. Two backends are
//! available: the local store (default) and the OS keyring.

use crate::chat::Provider;
use crate::config::CredentialBackend;
use crate::error::{MedlifeError, Result};
use crate::storage::LocalRepository;

use std::sync::Arc;

/// Keyring service name for every stored key
pub const KEYRING_SERVICE: &str = "medlife";

/// Storage for provider API keys
pub trait CredentialStore: Send + Sync {
    /// Stored key, `None` when missing or blank
    fn get(&self, email: &str, provider: Provider) -> Result<Option<String>>;

    /// Store a key; a blank key clears the entry
    fn set(&self, email: &str, provider: Provider, key: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn clear(&self, email: &str, provider: Provider) -> Result<()>;
}

/// Keys kept in the local store next to the rest of the account data
pub struct LocalCredentials {
    repo: LocalRepository,
}

impl LocalCredentials {
    pub fn new(repo: LocalRepository) -> Self {
        Self { repo }
    }
}

impl CredentialStore for LocalCredentials {
    fn get(&self, email: &str, provider: Provider) -> Result<Option<String>> {
        self.repo.account(email).api_key(provider)
    }

    fn set(&self, email: &str, provider: Provider, key: &str) -> Result<()> {
        let account = self.repo.account(email);
        let key = key.trim();
        if key.is_empty() {
            account.remove_api_key(provider)
        } else {
            account.set_api_key(provider, key)
        }
    }

    fn clear(&self, email: &str, provider: Provider) -> Result<()> {
        self.repo.account(email).remove_api_key(provider)
    }
}

/// Keys kept in the OS keyring
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentials;

impl KeyringCredentials {
    fn entry(email: &str, provider: Provider) -> Result<keyring::Entry> {
        let user = format!("{}_{}", provider.as_str(), email);
        Ok(keyring::Entry::new(KEYRING_SERVICE, &user).map_err(MedlifeError::Keyring)?)
    }
}

impl CredentialStore for KeyringCredentials {
    fn get(&self, email: &str, provider: Provider) -> Result<Option<String>> {
        match Self::entry(email, provider)?.get_password() {
            Ok(key) if key.trim().is_empty() => Ok(None),
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(MedlifeError::Keyring(e).into()),
        }
    }

    fn set(&self, email: &str, provider: Provider, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return self.clear(email, provider);
        }
        Self::entry(email, provider)?
            .set_password(key)
            .map_err(MedlifeError::Keyring)?;
        Ok(())
    }

    fn clear(&self, email: &str, provider: Provider) -> Result<()> {
        match Self::entry(email, provider)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(MedlifeError::Keyring(e).into()),
        }
    }
}

/// Build the configured credential store
pub fn credential_store(backend: CredentialBackend, repo: LocalRepository) -> Arc<dyn CredentialStore> {
    match backend {
        CredentialBackend::Local => Arc::new(LocalCredentials::new(repo)),
        CredentialBackend::Keyring => Arc::new(KeyringCredentials),
    }
}

/// Mask a key for display
///
/// # Examples
///
/// ```
/// use medlife::credentials::mask_key;
///
/// assert_eq!(mask_key("sk-abcdef123456"), "sk-****456");
/// assert_eq!(mask_key("short"), "*****");
/// ```
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}****{}", head, tail)
}
