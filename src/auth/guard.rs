//! Entry routing on process start

use crate::backend::Backend;
use crate::config::SessionConfig;
use crate::members::{Member, MemberRegistry};
use crate::storage::{LocalRepository, LoginMarkers};

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Where the user lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRoute {
    /// Anonymous landing screen
    Landing,
    /// Authenticated member list
    Dashboard { email: String },
    /// Straight into chat with the first member
    Chat { email: String, member: Box<Member> },
}

/// Checks the persisted login markers and picks the entry route
pub struct SessionGuard {
    repo: LocalRepository,
    backend: Arc<dyn Backend>,
    session: SessionConfig,
}

impl SessionGuard {
    pub fn new(repo: LocalRepository, backend: Arc<dyn Backend>, session: SessionConfig) -> Self {
        Self {
            repo,
            backend,
            session,
        }
    }

    /// Route for a process starting at `now`
    ///
    /// An expired, incomplete or unreadable session wipes the whole local
    /// store. Never fails.
    pub async fn route(&self, now: DateTime<Utc>) -> EntryRoute {
        let ttl = match self.session.ttl() {
            Ok(ttl) => ttl,
            Err(e) => {
                tracing::error!("Unusable session TTL: {}", e);
                return EntryRoute::Landing;
            }
        };

        // Unreadable markers count as an invalid session
        let markers = self.repo.login_markers().unwrap_or_else(|e| {
            tracing::error!("Failed to read login markers: {}", e);
            LoginMarkers::default()
        });

        let email = match markers.email.clone().filter(|e| !e.is_empty()) {
            Some(email) if markers.is_valid_at(now, ttl) => email,
            _ => {
                tracing::info!("No valid session, clearing local state");
                if let Err(e) = self.repo.wipe() {
                    tracing::error!("Failed to clear local state: {}", e);
                }
                return EntryRoute::Landing;
            }
        };

        if self.session.resume_first_member {
            let registry = MemberRegistry::new(Arc::clone(&self.backend), self.repo.account(&email));
            if let Some(member) = registry.list().await.into_iter().next() {
                return EntryRoute::Chat {
                    email,
                    member: Box::new(member),
                };
            }
        }
        EntryRoute::Dashboard { email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::test_utils::mock_backend;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn session(resume: bool) -> SessionConfig {
        SessionConfig {
            ttl_days: 7,
            resume_first_member: resume,
        }
    }

    #[tokio::test]
    async fn test_fresh_login_routes_to_dashboard() {
        let (_server, backend) = mock_backend().await;
        let store = Arc::new(MemoryStore::new());
        let repo = LocalRepository::new(store);
        repo.record_login("jane@example.com", "tok", Utc::now() - chrono::Duration::days(6))
            .unwrap();

        let guard = SessionGuard::new(repo, backend, session(false));
        assert_eq!(
            guard.route(Utc::now()).await,
            EntryRoute::Dashboard {
                email: "jane@example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_expired_login_wipes_store() {
        let (_server, backend) = mock_backend().await;
        let store = Arc::new(MemoryStore::new());
        let repo = LocalRepository::new(store.clone());
        repo.record_login("jane@example.com", "tok", Utc::now() - chrono::Duration::days(8))
            .unwrap();
        repo.account("jane@example.com")
            .save_chat_history(&[crate::chat::ChatSession::new("Chat 1")])
            .unwrap();

        let guard = SessionGuard::new(repo, backend, session(false));
        assert_eq!(guard.route(Utc::now()).await, EntryRoute::Landing);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_login_time_wipes_store() {
        let (_server, backend) = mock_backend().await;
        let store = Arc::new(MemoryStore::new());
        store.set("loginTime", "not-a-number").unwrap();
        store.set("isLoggedIn", "true").unwrap();
        store.set("userEmail", "jane@example.com").unwrap();
        let guard = SessionGuard::new(LocalRepository::new(store.clone()), backend, session(false));

        assert_eq!(guard.route(Utc::now()).await, EntryRoute::Landing);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_routes_to_landing() {
        let (_server, backend) = mock_backend().await;
        let repo = LocalRepository::new(Arc::new(MemoryStore::new()));
        repo.record_login("jane@example.com", "tok", Utc::now()).unwrap();
        let config = SessionConfig {
            ttl_days: u64::MAX,
            resume_first_member: false,
        };

        let guard = SessionGuard::new(repo, backend, config);
        assert_eq!(guard.route(Utc::now()).await, EntryRoute::Landing);
    }

    #[tokio::test]
    async fn test_resume_first_member_deep_links() {
        let (server, backend) = mock_backend().await;
        Mock::given(method("GET"))
            .and(path("/getmember"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "members": [{"firstName": "Jane", "lastName": "Doe"}]
            })))
            .mount(&server)
            .await;
        let repo = LocalRepository::new(Arc::new(MemoryStore::new()));
        repo.record_login("jane@example.com", "tok", Utc::now()).unwrap();

        let guard = SessionGuard::new(repo, backend, session(true));
        match guard.route(Utc::now()).await {
            EntryRoute::Chat { email, member } => {
                assert_eq!(email, "jane@example.com");
                assert_eq!(member.member_index, 1);
            }
            other => panic!("unexpected route {:?}", other),
        }
    }
}
