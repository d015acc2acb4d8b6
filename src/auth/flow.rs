//! Sign-up, OTP login, password reset and logout

use crate::backend::{Backend, BackendError, SignUpRequest};
use crate::error::{MedlifeError, Result};
use crate::storage::LocalRepository;
use crate::validation::{
    parse_login_identifier, validate_email, validate_otp, validate_password,
    validate_password_confirmation, validate_phone, validate_username, LoginChannel,
};

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const MSG_ACCOUNT_EXISTS: &str = "Account already exists. Please log in.";
pub const MSG_ACCOUNT_NOT_FOUND: &str = "Account not found. Please register first.";
pub const MSG_NO_RESET_EMAIL: &str = "No password reset in progress. Request a reset code first.";

/// Fallback display name
pub const DEFAULT_USERNAME: &str = "User";

/// Account flows talking to the backend and the login markers
pub struct AuthService {
    backend: Arc<dyn Backend>,
    repo: LocalRepository,
}

impl AuthService {
    pub fn new(backend: Arc<dyn Backend>, repo: LocalRepository) -> Self {
        Self { backend, repo }
    }

    /// Register a new account
    pub async fn signup(&self, username: &str, email: &str, mobile: &str) -> Result<()> {
        validate_username(username).map_err(MedlifeError::from)?;
        validate_email(email).map_err(MedlifeError::from)?;
        validate_phone(mobile).map_err(MedlifeError::from)?;

        let request = SignUpRequest {
            username: username.trim().to_string(),
            email: email.to_string(),
            mobile: mobile.to_string(),
        };
        match self.backend.sign_up(&request).await {
            Ok(()) => {
                tracing::info!("Registered account {}", email);
                Ok(())
            }
            Err(BackendError::Status {
                status, message, ..
            }) if status == 409 || message.to_lowercase().contains("already exists") => {
                Err(MedlifeError::Auth(MSG_ACCOUNT_EXISTS.to_string()).into())
            }
            Err(e) => Err(MedlifeError::from(e).into()),
        }
    }

    /// Ask for a login OTP; returns the channel it was sent through
    pub async fn request_otp(&self, identifier: &str) -> Result<LoginChannel> {
        let (channel, identifier) = parse_login_identifier(identifier).map_err(MedlifeError::from)?;
        match self.backend.request_login_otp(channel, &identifier).await {
            Ok(()) => {
                tracing::info!("Login code sent via {}", channel.as_str());
                Ok(channel)
            }
            Err(BackendError::Status { message, .. })
                if message.to_lowercase().contains("not found") =>
            {
                Err(MedlifeError::Auth(MSG_ACCOUNT_NOT_FOUND.to_string()).into())
            }
            Err(e) => Err(MedlifeError::from(e).into()),
        }
    }

    /// Verify a login OTP and record the session at `now`
    ///
    /// The identifier becomes the account email.
    pub async fn verify_otp(&self, identifier: &str, otp: &str, now: DateTime<Utc>) -> Result<String> {
        let (channel, identifier) = parse_login_identifier(identifier).map_err(MedlifeError::from)?;
        validate_otp(otp.trim()).map_err(MedlifeError::from)?;

        let token = self
            .backend
            .verify_login_otp(channel, &identifier, otp.trim())
            .await?;
        self.repo.record_login(&identifier, &token, now)?;
        tracing::info!("Logged in as {}", identifier);
        Ok(identifier)
    }

    /// Start a password reset for `email`
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        validate_email(email).map_err(MedlifeError::from)?;
        self.backend.forgot_password(email).await?;
        self.repo.set_reset_email(email)?;
        Ok(())
    }

    /// Complete a password reset
    ///
    /// `email` defaults to the address of the reset in progress.
    pub async fn reset_password(
        &self,
        email: Option<&str>,
        otp: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<()> {
        let email = match email {
            Some(email) => email.to_string(),
            None => self
                .repo
                .reset_email()?
                .ok_or_else(|| MedlifeError::Auth(MSG_NO_RESET_EMAIL.to_string()))?,
        };
        validate_otp(otp.trim()).map_err(MedlifeError::from)?;
        validate_password(new_password).map_err(MedlifeError::from)?;
        validate_password_confirmation(new_password, confirm).map_err(MedlifeError::from)?;

        self.backend
            .reset_password(&email, otp.trim(), new_password)
            .await?;
        self.repo.clear_reset_email()?;
        tracing::info!("Password reset for {}", email);
        Ok(())
    }

    /// Forget the signed-in account on this device
    pub fn logout(&self) -> Result<()> {
        if let Some(email) = self.repo.current_email()? {
            let account = self.repo.account(&email);
            account.set_selected_provider(None)?;
            account.clear_current_member()?;
            tracing::info!("Logged out {}", email);
        }
        self.repo.clear_login()
    }

    /// Display name of `email`, [`DEFAULT_USERNAME`] on any failure
    pub async fn username(&self, email: &str) -> String {
        match self.backend.username(email).await {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => DEFAULT_USERNAME.to_string(),
            Err(e) => {
                tracing::debug!("Username lookup failed: {}", e);
                DEFAULT_USERNAME.to_string()
            }
        }
    }
}
