//! Medlife - family health assistant client library
//!
//! This library provides the client side of the Medlife service: account
//! sessions, the family member registry, AI provider keys, chat sessions and
//! transcript export.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: sign-up, OTP login, password reset and the session guard
//! - `backend`: HTTP client for the Medlife backend
//! - `members`: family member registry
//! - `credentials`: per-provider API key storage
//! - `chat`: chat sessions, sending and transcript export
//! - `storage`: local key-value persistence
//! - `validation`: form field validation
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use medlife::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod members;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use backend::{Backend, BackendError, HttpBackend};
pub use chat::{ChatSession, ChatSessionManager, Message, Provider};
pub use config::Config;
pub use error::{MedlifeError, Result};
pub use members::{Member, MemberRegistry};

#[cfg(test)]
pub mod test_utils;
