//! Error types for Medlife
//!
//! This module defines the error types used throughout the client core,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::backend::BackendError;

/// Main error type for Medlife operations
///
/// Covers configuration loading, field validation, local persistence,
/// backend interactions and the member/chat reconciliation rules.
#[derive(Error, Debug)]
pub enum MedlifeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A form field failed validation
    #[error("{message}")]
    Validation {
        /// Field that failed
        field: &'static str,
        /// User-facing message
        message: String,
    },

    /// Local key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backend request errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Sign-up or sign-in was rejected with a user-facing reason
    #[error("{0}")]
    Auth(String),

    /// The account already holds the maximum number of members
    #[error("Maximum of {limit} members allowed per user")]
    MemberLimit {
        /// Configured member cap
        limit: usize,
    },

    /// A member reference no longer matches the backend list
    #[error("Member no longer exists: {0}. Refresh the member list and try again")]
    StaleMember(String),

    /// A command needs a logged-in account
    #[error("User not logged in")]
    NotLoggedIn,

    /// Chat session lookup failed
    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    /// A member must be selected for the requested chat action
    #[error("Please select a family member first")]
    NoMemberSelected,

    /// Transcript export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Credential storage errors
    #[error("Credential error: {0}")]
    Credentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl MedlifeError {
    /// Build a validation error for `field`
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result type alias for Medlife operations
///
/// Uses `anyhow::Error` so handlers can attach context while still being able
/// to downcast to [`MedlifeError`] at the boundary.
pub type Result<T> = anyhow::Result<T>;
