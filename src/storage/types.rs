use chrono::{DateTime, TimeZone, Utc};

/// Logical keys of the local store
///
/// Global keys are shared by the whole device; account keys are suffixed
/// with the account email so several accounts never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKey {
    IsLoggedIn,
    AccessToken,
    LoginTime,
    UserEmail,
    ResetEmail,
    MembersList,
    ChatHistory,
    ApiKey(String),
    SelectedProvider,
    KeyPromptStatus,
    CurrentMember,
}

impl StorageKey {
    fn base(&self) -> String {
        match self {
            StorageKey::IsLoggedIn => "isLoggedIn".to_string(),
            StorageKey::AccessToken => "accessToken".to_string(),
            StorageKey::LoginTime => "loginTime".to_string(),
            StorageKey::UserEmail => "userEmail".to_string(),
            StorageKey::ResetEmail => "resetEmail".to_string(),
            StorageKey::MembersList => "membersList".to_string(),
            StorageKey::ChatHistory => "chatHistory".to_string(),
            StorageKey::ApiKey(provider) => format!("api_key_{}", provider),
            StorageKey::SelectedProvider => "selectedAPI".to_string(),
            StorageKey::KeyPromptStatus => "keyPromptStatus".to_string(),
            StorageKey::CurrentMember => "currentMember".to_string(),
        }
    }

    /// Whether the key is scoped to one account
    pub fn is_account_scoped(&self) -> bool {
        !matches!(
            self,
            StorageKey::IsLoggedIn
                | StorageKey::AccessToken
                | StorageKey::LoginTime
                | StorageKey::UserEmail
                | StorageKey::ResetEmail
        )
    }

    /// Concrete store key, suffixed with `email` for account-scoped keys
    ///
    /// # Examples
    ///
    /// ```
    /// use medlife::storage::StorageKey;
    ///
    /// assert_eq!(StorageKey::UserEmail.format("jane@example.com"), "userEmail");
    /// assert_eq!(
    ///     StorageKey::ChatHistory.format("jane@example.com"),
    ///     "chatHistory_jane@example.com"
    /// );
    /// ```
    pub fn format(&self, email: &str) -> String {
        if self.is_account_scoped() {
            format!("{}_{}", self.base(), email)
        } else {
            self.base()
        }
    }
}

/// Persisted login markers read by the session guard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginMarkers {
    pub logged_in: bool,
    pub access_token: Option<String>,
    /// Login instant in milliseconds since the Unix epoch
    pub login_time_ms: Option<i64>,
    pub email: Option<String>,
}

impl LoginMarkers {
    /// Login instant, if recorded and representable
    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.login_time_ms
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Whether the markers describe a session younger than `ttl` at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        let has_token = self
            .access_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        match self.login_time() {
            Some(login) if self.logged_in && has_token => now - login < ttl,
            _ => false,
        }
    }
}
