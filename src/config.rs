//! Configuration management for Medlife
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MedlifeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Medlife
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Login session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Local persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Where provider API keys are kept
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Member registry settings
    #[serde(default)]
    pub members: MembersConfig,
    /// Chat behaviour settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Transcript export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Medlife API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Login session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a login stays valid (days)
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,

    /// Resolve the first member on start and route straight into chat
    #[serde(default)]
    pub resume_first_member: bool,
}

fn default_ttl_days() -> u64 {
    7
}

/// Longest accepted session TTL (days)
pub const MAX_TTL_DAYS: u64 = 3650;

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            resume_first_member: false,
        }
    }
}

impl SessionConfig {
    /// Session time-to-live as a chrono duration
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::Config` when `ttl_days` does not fit a duration
    pub fn ttl(&self) -> Result<chrono::Duration> {
        i64::try_from(self.ttl_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .ok_or_else(|| {
                MedlifeError::Config(format!("session.ttl_days out of range: {}", self.ttl_days))
                    .into()
            })
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory of the sled store; platform data dir when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl StorageConfig {
    /// Resolve the on-disk store location
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(PathBuf::from(path));
        }
        let proj_dirs = directories::ProjectDirs::from("ai", "medlife", "medlife")
            .ok_or_else(|| MedlifeError::Storage("Could not determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join("store"))
    }
}

/// Credential backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// Keys live in the local key-value store next to the account data
    #[default]
    Local,
    /// Keys live in the operating system keyring
    Keyring,
}

impl std::str::FromStr for CredentialBackend {
    type Err = MedlifeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "keyring" => Ok(Self::Keyring),
            other => Err(MedlifeError::Config(format!(
                "Invalid credentials backend: {}. Must be one of: local, keyring",
                other
            ))),
        }
    }
}

/// Credential configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Storage backend for provider API keys
    #[serde(default)]
    pub backend: CredentialBackend,
}

/// Member registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersConfig {
    /// Maximum members per account (enforced client-side)
    #[serde(default = "default_max_members")]
    pub max_members: usize,
}

fn default_max_members() -> usize {
    4
}

impl Default for MembersConfig {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
        }
    }
}

/// Chat behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Display name for assistant messages
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Maximum characters of a derived chat title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_assistant_name() -> String {
    "Medlife.ai".to_string()
}

fn default_title_max_chars() -> usize {
    40
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

/// Transcript export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for exported transcripts
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// External HTML to PDF converter, invoked as `<converter> <html> <pdf>`
    #[serde(default)]
    pub converter: Option<String>,
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            converter: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MedlifeError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MedlifeError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("MEDLIFE_BACKEND_URL") {
            self.backend.base_url = url;
        }

        if let Ok(timeout) = std::env::var("MEDLIFE_BACKEND_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.backend.timeout_seconds = secs,
                Err(_) => tracing::warn!("Ignoring invalid MEDLIFE_BACKEND_TIMEOUT: {}", timeout),
            }
        }

        if let Ok(ttl) = std::env::var("MEDLIFE_SESSION_TTL_DAYS") {
            match ttl.parse() {
                Ok(days) => self.session.ttl_days = days,
                Err(_) => tracing::warn!("Ignoring invalid MEDLIFE_SESSION_TTL_DAYS: {}", ttl),
            }
        }

        if let Ok(path) = std::env::var("MEDLIFE_STORAGE_PATH") {
            self.storage.path = Some(path);
        }

        if let Ok(backend) = std::env::var("MEDLIFE_CREDENTIALS_BACKEND") {
            self.credentials.backend = backend.parse()?;
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.backend_url {
            tracing::debug!("Using backend URL override from CLI: {}", url);
            self.backend.base_url = url.clone();
        }
        if let Some(path) = &cli.storage_path {
            tracing::debug!("Using storage path override from CLI: {}", path);
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of its accepted range
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(MedlifeError::Config("backend.base_url cannot be empty".to_string()).into());
        }

        if let Err(e) = url::Url::parse(&self.backend.base_url) {
            return Err(MedlifeError::Config(format!(
                "backend.base_url is not a valid URL ({}): {}",
                self.backend.base_url, e
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(MedlifeError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.ttl_days == 0 {
            return Err(
                MedlifeError::Config("session.ttl_days must be greater than 0".to_string()).into(),
            );
        }

        if self.session.ttl_days > MAX_TTL_DAYS {
            return Err(MedlifeError::Config(format!(
                "session.ttl_days must be at most {}",
                MAX_TTL_DAYS
            ))
            .into());
        }

        if self.members.max_members == 0 || self.members.max_members > 16 {
            return Err(MedlifeError::Config(
                "members.max_members must be between 1 and 16".to_string(),
            )
            .into());
        }

        if self.chat.title_max_chars == 0 {
            return Err(MedlifeError::Config(
                "chat.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.assistant_name.trim().is_empty() {
            return Err(
                MedlifeError::Config("chat.assistant_name cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}
