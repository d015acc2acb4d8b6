//! Command-line interface definition for Medlife
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for accounts, members, API keys, chat and export.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Medlife - family health assistant client
///
/// Manage up to four family members and chat with an AI assistant about
/// their health records.
#[derive(Parser, Debug, Clone)]
#[command(name = "medlife")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Directory of the local store
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Backend base URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Keep all local state in memory for this run only
    #[arg(long)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Medlife
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check the stored session and show where the app opens
    Start,

    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Mobile number, 10 to 15 digits
        #[arg(long)]
        mobile: String,
    },

    /// Request a login code by email or SMS
    Login {
        /// Email address or phone number
        identifier: String,
    },

    /// Verify a login code
    Verify {
        /// Email address or phone number used for `login`
        identifier: String,
        /// Six digit code
        otp: String,
    },

    /// Request a password reset code
    ForgotPassword {
        email: String,
    },

    /// Set a new password with a reset code
    ResetPassword {
        #[arg(long)]
        otp: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
        /// Defaults to the address given to `forgot-password`
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the signed-in account on this device
    Logout,

    /// Manage family members
    Members {
        #[command(subcommand)]
        command: MemberCommand,
    },

    /// Manage AI provider keys
    Keys {
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Start an interactive chat
    Chat {
        /// Member number as shown by `members list`
        #[arg(short, long)]
        member: Option<u32>,
    },

    /// Manage saved chat sessions
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Export a member's stored transcript
    Export {
        /// Member number as shown by `members list`
        #[arg(short, long)]
        member: Option<u32>,
        /// Output file; `.html` is written, `.pdf` too when a converter is set
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Member fields accepted by `members add` and `members edit`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFieldArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Date of birth
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long)]
    pub race: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub height: Option<String>,
    #[arg(long)]
    pub weight: Option<String>,
    #[arg(long)]
    pub a1c: Option<String>,
    #[arg(long)]
    pub blood_pressure: Option<String>,
    #[arg(long)]
    pub medicine: Option<String>,
    #[arg(long)]
    pub bmi: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
    /// Prescription image or PDF whose medicines are appended
    #[arg(long)]
    pub prescription: Option<PathBuf>,
}

/// Member subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MemberCommand {
    /// List members
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show all fields of a member
    Show { index: u32 },

    /// Add a member
    Add {
        #[command(flatten)]
        fields: MemberFieldArgs,
    },

    /// Edit a member; omitted fields keep their value
    Edit {
        index: u32,
        #[command(flatten)]
        fields: MemberFieldArgs,
    },

    /// Delete a member
    Delete { index: u32 },

    /// Extract medicines from a prescription
    Ocr { file: PathBuf },
}

/// API key subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KeyCommand {
    /// Show stored keys (masked) and the selected provider
    List,

    /// Store a key; an empty key removes it
    Set { provider: String, key: String },

    /// Choose the provider used for chat
    Select { provider: String },

    /// Close the key prompt without adding a key
    Dismiss,
}

/// Chat history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved sessions
    List,

    /// Make a session active
    Select { index: usize },

    /// Rename a session
    Rename { index: usize, name: String },

    /// Delete a session
    Delete { index: usize },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            storage_path: None,
            backend_url: None,
            ephemeral: false,
            command: Commands::Start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Start));
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "medlife",
            "-v",
            "--json-logs",
            "--storage-path",
            "/tmp/store",
            "--backend-url",
            "http://api.test",
            "start",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/store"));
        assert_eq!(cli.backend_url.as_deref(), Some("http://api.test"));
    }

    #[test]
    fn test_cli_parse_verify() {
        let cli = Cli::try_parse_from(["medlife", "verify", "jane@example.com", "123456"]).unwrap();
        if let Commands::Verify { identifier, otp } = cli.command {
            assert_eq!(identifier, "jane@example.com");
            assert_eq!(otp, "123456");
        } else {
            panic!("Expected Verify command");
        }
    }

    #[test]
    fn test_cli_parse_members_add_fields() {
        let cli = Cli::try_parse_from([
            "medlife",
            "members",
            "add",
            "--first-name",
            "Jane",
            "--last-name",
            "Doe",
            "--blood-pressure",
            "120/80",
        ])
        .unwrap();
        if let Commands::Members {
            command: MemberCommand::Add { fields },
        } = cli.command
        {
            assert_eq!(fields.first_name.as_deref(), Some("Jane"));
            assert_eq!(fields.blood_pressure.as_deref(), Some("120/80"));
            assert_eq!(fields.height, None);
        } else {
            panic!("Expected Members Add command");
        }
    }

    #[test]
    fn test_cli_parse_members_edit_index() {
        let cli = Cli::try_parse_from(["medlife", "members", "edit", "2", "--weight", "70"]).unwrap();
        if let Commands::Members {
            command: MemberCommand::Edit { index, fields },
        } = cli.command
        {
            assert_eq!(index, 2);
            assert_eq!(fields.weight.as_deref(), Some("70"));
        } else {
            panic!("Expected Members Edit command");
        }
    }

    #[test]
    fn test_cli_parse_keys_set() {
        let cli = Cli::try_parse_from(["medlife", "keys", "set", "openai", "sk-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Keys {
                command: KeyCommand::Set { .. }
            }
        ));
    }

    #[test]
    fn test_cli_parse_history_rename() {
        let cli = Cli::try_parse_from(["medlife", "history", "rename", "1", "Diet plan"]).unwrap();
        if let Commands::History {
            command: HistoryCommand::Rename { index, name },
        } = cli.command
        {
            assert_eq!(index, 1);
            assert_eq!(name, "Diet plan");
        } else {
            panic!("Expected History Rename command");
        }
    }

    #[test]
    fn test_cli_parse_chat_member() {
        let cli = Cli::try_parse_from(["medlife", "chat", "--member", "3"]).unwrap();
        if let Commands::Chat { member } = cli.command {
            assert_eq!(member, Some(3));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["medlife"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        assert!(Cli::try_parse_from(["medlife", "invalid"]).is_err());
    }
}
