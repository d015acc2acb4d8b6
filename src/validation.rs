//! Form field validation
//!
//! Stateless predicates for every user-entered field. Each check returns
//! `Ok(())` or a [`FieldError`] carrying the message shown next to the field.
//! Checks are independent and cheap enough to run on every keystroke.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// A single field validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldError {
    /// Field name the failure belongs to
    pub field: &'static str,
    /// Message to display
    pub message: &'static str,
}

impl FieldError {
    const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl From<FieldError> for crate::error::MedlifeError {
    fn from(e: FieldError) -> Self {
        crate::error::MedlifeError::validation(e.field, e.message)
    }
}

/// Result of a field check
pub type FieldResult = std::result::Result<(), FieldError>;

pub const MSG_INVALID_EMAIL: &str = "Please enter a valid email address";
pub const MSG_EMAIL_CAPITALS: &str = "Email should not contain capital letters";
pub const MSG_INVALID_PHONE: &str = "Please enter a valid phone number";
pub const MSG_PASSWORD_LENGTH: &str = "Password must be at least 8 characters";
pub const MSG_PASSWORD_UPPER: &str = "Password must contain at least one uppercase letter";
pub const MSG_PASSWORD_LOWER: &str = "Password must contain at least one lowercase letter";
pub const MSG_PASSWORD_DIGIT: &str = "Password must contain at least one number";
pub const MSG_PASSWORD_SPECIAL: &str = "Password must contain at least one special character";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MSG_OTP_REQUIRED: &str = "OTP is required";
pub const MSG_OTP_LENGTH: &str = "OTP must be 6 digits";
pub const MSG_USERNAME_REQUIRED: &str = "Please enter your username";
pub const MSG_LOGIN_REQUIRED: &str = "Please enter your email or phone number";
pub const MSG_MEMBER_NAMES: &str = "First name and last name are required";

pub const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email regex is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{10,15}$").expect("phone regex is valid"))
}

/// Validate an email address
///
/// Uppercase characters are rejected outright rather than normalized.
///
/// # Examples
///
/// ```
/// use medlife::validation::{validate_email, MSG_EMAIL_CAPITALS};
///
/// assert!(validate_email("jane@example.com").is_ok());
/// assert_eq!(validate_email("Jane@example.com").unwrap_err().message, MSG_EMAIL_CAPITALS);
/// ```
pub fn validate_email(input: &str) -> FieldResult {
    if input.is_empty() {
        return Err(FieldError::new("email", MSG_INVALID_EMAIL));
    }
    if input.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(FieldError::new("email", MSG_EMAIL_CAPITALS));
    }
    if !email_regex().is_match(input) {
        return Err(FieldError::new("email", MSG_INVALID_EMAIL));
    }
    Ok(())
}

/// Validate a phone or mobile number (10 to 15 digits)
pub fn validate_phone(input: &str) -> FieldResult {
    if phone_regex().is_match(input) {
        Ok(())
    } else {
        Err(FieldError::new("phone", MSG_INVALID_PHONE))
    }
}

/// Validate a password against the policy
///
/// Rules are checked in a fixed order and the first failure is reported:
/// length, uppercase, lowercase, digit, special character.
pub fn validate_password(input: &str) -> FieldResult {
    let rules: [(fn(&str) -> bool, &'static str); 5] = [
        (|p| p.chars().count() >= MIN_PASSWORD_LEN, MSG_PASSWORD_LENGTH),
        (|p| p.chars().any(char::is_uppercase), MSG_PASSWORD_UPPER),
        (|p| p.chars().any(char::is_lowercase), MSG_PASSWORD_LOWER),
        (|p| p.chars().any(|c| c.is_ascii_digit()), MSG_PASSWORD_DIGIT),
        (
            |p| p.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
            MSG_PASSWORD_SPECIAL,
        ),
    ];

    for (check, message) in rules {
        if !check(input) {
            return Err(FieldError::new("password", message));
        }
    }
    Ok(())
}

/// Validate that the confirmation matches the password
pub fn validate_password_confirmation(password: &str, confirm: &str) -> FieldResult {
    if password == confirm {
        Ok(())
    } else {
        Err(FieldError::new("confirm_password", MSG_PASSWORD_MISMATCH))
    }
}

/// Validate a one-time password (exactly six digits)
pub fn validate_otp(input: &str) -> FieldResult {
    if input.is_empty() {
        return Err(FieldError::new("otp", MSG_OTP_REQUIRED));
    }
    if input.len() == 6 && input.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(FieldError::new("otp", MSG_OTP_LENGTH))
    }
}

/// Validate a sign-up username
pub fn validate_username(input: &str) -> FieldResult {
    if input.trim().is_empty() {
        Err(FieldError::new("username", MSG_USERNAME_REQUIRED))
    } else {
        Ok(())
    }
}

/// Delivery channel for a login OTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginChannel {
    Email,
    Sms,
}

impl LoginChannel {
    /// Wire name used by the sign-in endpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginChannel::Email => "email",
            LoginChannel::Sms => "sms",
        }
    }
}

/// Classify and validate a login identifier
///
/// Anything containing `@` is treated as an email, everything else as a
/// phone number. Returns the channel and the trimmed identifier.
pub fn parse_login_identifier(input: &str) -> std::result::Result<(LoginChannel, String), FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("login", MSG_LOGIN_REQUIRED));
    }
    if trimmed.contains('@') {
        validate_email(trimmed)?;
        Ok((LoginChannel::Email, trimmed.to_string()))
    } else {
        validate_phone(trimmed)?;
        Ok((LoginChannel::Sms, trimmed.to_string()))
    }
}

/// Validate the required member name fields
pub fn validate_member_names(first_name: &str, last_name: &str) -> FieldResult {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        Err(FieldError::new("name", MSG_MEMBER_NAMES))
    } else {
        Ok(())
    }
}

/// Keep only digits and dots (height, weight, BMI inputs)
///
/// # Examples
///
/// ```
/// use medlife::validation::numeric_only;
///
/// assert_eq!(numeric_only("5 ft 10.5 in"), "510.5");
/// ```
pub fn numeric_only(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rejects_any_uppercase() {
        for input in ["A@b.co", "jane@Example.com", "JANE@EXAMPLE.COM", "Not an email"] {
            let err = validate_email(input).unwrap_err();
            assert_eq!(err.message, MSG_EMAIL_CAPITALS, "input: {}", input);
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("jane.doe+1@mail.example.org").is_ok());
        assert_eq!(validate_email("").unwrap_err().message, MSG_INVALID_EMAIL);
        assert_eq!(validate_email("jane@").unwrap_err().message, MSG_INVALID_EMAIL);
        assert_eq!(validate_email("jane@example.c").unwrap_err().message, MSG_INVALID_EMAIL);
        assert_eq!(validate_email("ja ne@example.com").unwrap_err().message, MSG_INVALID_EMAIL);
    }

    #[test]
    fn test_phone_length_bounds() {
        assert!(validate_phone("0123456789").is_ok());
        assert!(validate_phone("012345678901234").is_ok());
        assert!(validate_phone("012345678").is_err());
        assert!(validate_phone("0123456789012345").is_err());
        assert!(validate_phone("01234-56789").is_err());
    }

    #[test]
    fn test_password_first_failing_rule_wins() {
        assert_eq!(validate_password("").unwrap_err().message, MSG_PASSWORD_LENGTH);
        assert_eq!(validate_password("Ab1!").unwrap_err().message, MSG_PASSWORD_LENGTH);
        assert_eq!(validate_password("abcdefgh").unwrap_err().message, MSG_PASSWORD_UPPER);
        assert_eq!(validate_password("ABCDEFGH").unwrap_err().message, MSG_PASSWORD_LOWER);
        assert_eq!(validate_password("Abcdefgh").unwrap_err().message, MSG_PASSWORD_DIGIT);
        assert_eq!(validate_password("Abcdefg1").unwrap_err().message, MSG_PASSWORD_SPECIAL);
        assert!(validate_password("Abcdefg1!").is_ok());
    }

    #[test]
    fn test_password_whitespace_is_not_special() {
        assert_eq!(validate_password("Abcdef 1").unwrap_err().message, MSG_PASSWORD_SPECIAL);
    }

    #[test]
    fn test_otp() {
        assert!(validate_otp("123456").is_ok());
        assert_eq!(validate_otp("").unwrap_err().message, MSG_OTP_REQUIRED);
        assert_eq!(validate_otp("12345").unwrap_err().message, MSG_OTP_LENGTH);
        assert_eq!(validate_otp("1234567").unwrap_err().message, MSG_OTP_LENGTH);
        assert_eq!(validate_otp("12a456").unwrap_err().message, MSG_OTP_LENGTH);
    }

    #[test]
    fn test_login_identifier_channels() {
        let (channel, id) = parse_login_identifier("  jane@example.com ").unwrap();
        assert_eq!(channel, LoginChannel::Email);
        assert_eq!(id, "jane@example.com");

        let (channel, _) = parse_login_identifier("5551234567").unwrap();
        assert_eq!(channel, LoginChannel::Sms);

        assert_eq!(parse_login_identifier("   ").unwrap_err().message, MSG_LOGIN_REQUIRED);
        assert_eq!(parse_login_identifier("555").unwrap_err().message, MSG_INVALID_PHONE);
    }

    #[test]
    fn test_member_names_required() {
        assert!(validate_member_names("Jane", "Doe").is_ok());
        assert!(validate_member_names("Jane", "  ").is_err());
        assert!(validate_member_names("", "Doe").is_err());
    }

    #[test]
    fn test_numeric_only() {
        assert_eq!(numeric_only("72 kg"), "72");
        assert_eq!(numeric_only("24.5"), "24.5");
        assert_eq!(numeric_only(""), "");
    }

    #[test]
    fn test_confirmation() {
        assert!(validate_password_confirmation("Abcdefg1!", "Abcdefg1!").is_ok());
        assert_eq!(
            validate_password_confirmation("Abcdefg1!", "Abcdefg1?").unwrap_err().message,
            MSG_PASSWORD_MISMATCH
        );
    }
}
