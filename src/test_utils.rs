//! Test utilities for Medlife
//!
//! Builders for members and for components wired to a `wiremock` server
//! over an in-memory store.

use crate::backend::{Backend, HttpBackend};
use crate::chat::{ChatSessionManager, KeySettings};
use crate::config::{BackendConfig, ChatConfig};
use crate::credentials::LocalCredentials;
use crate::members::Member;
use crate::storage::{AccountRepository, LocalRepository, MemoryStore};

use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

/// Account email used by the wired helpers
pub const TEST_EMAIL: &str = "jane@example.com";

/// Create a temporary directory for testing
///
/// The directory is removed when the returned value is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Member with just a name and index
pub fn member(first: &str, last: &str, index: u32) -> Member {
    Member {
        first_name: first.to_string(),
        last_name: last.to_string(),
        member_index: index,
        ..Default::default()
    }
}

/// Backend pointed at a fresh mock server
pub async fn mock_backend() -> (MockServer, Arc<dyn Backend>) {
    let server = MockServer::start().await;
    let config = BackendConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    };
    let backend = HttpBackend::new(&config).expect("Failed to build backend");
    (server, Arc::new(backend))
}

/// Mock backend plus an in-memory account for [`TEST_EMAIL`]
pub async fn mock_backend_with_repo() -> (MockServer, Arc<dyn Backend>, AccountRepository) {
    let (server, backend) = mock_backend().await;
    let repo = LocalRepository::new(Arc::new(MemoryStore::new()));
    (server, backend, repo.account(TEST_EMAIL))
}

/// Chat manager for [`TEST_EMAIL`] with locally stored keys
pub async fn chat_manager() -> (MockServer, ChatSessionManager, AccountRepository) {
    let (server, backend) = mock_backend().await;
    let local = LocalRepository::new(Arc::new(MemoryStore::new()));
    let account = local.account(TEST_EMAIL);
    let credentials = Arc::new(LocalCredentials::new(local));
    let keys = KeySettings::load(credentials, account.clone()).expect("Failed to load keys");
    let manager = ChatSessionManager::new(backend, account.clone(), keys, &ChatConfig::default());
    (server, manager, account)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_member_builder() {
        let m = member("Jane", "Doe", 2);
        assert_eq!(m.full_name(), "Jane Doe");
        assert_eq!(m.member_index, 2);
    }

    #[tokio::test]
    async fn test_chat_manager_uses_test_account() {
        let (_server, manager, repo) = chat_manager().await;
        assert_eq!(repo.email(), TEST_EMAIL);
        assert!(manager.sessions().is_empty());
    }
}
