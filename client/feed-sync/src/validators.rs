//! Form validation shared by the auth and post flows.
//! Every check runs before any remote call is made.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // Hardcoded pattern, always valid
    Regex::new(r"^\S+@\S+\.\S+$").expect("hardcoded email regex is invalid - fix source code")
});

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_BODY_LEN: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password required")]
    PasswordRequired,

    #[error("Minimum 6 characters")]
    PasswordTooShort,

    #[error("Please confirm password")]
    ConfirmRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Title must be at least 3 characters")]
    TitleTooShort,

    #[error("Body must be at least 10 characters")]
    BodyTooShort,

    #[error("Comment cannot be empty")]
    EmptyComment,
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Login form: email + password
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_password(password)
}

/// Registration form: email + password + confirmation
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    validate_credentials(email, password)?;
    if confirm.is_empty() {
        return Err(ValidationError::ConfirmRequired);
    }
    if confirm != password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Create/edit post form
pub fn validate_post(title: &str, body: &str) -> Result<(), ValidationError> {
    if title.trim().chars().count() < MIN_TITLE_LEN {
        return Err(ValidationError::TitleTooShort);
    }
    if body.trim().chars().count() < MIN_BODY_LEN {
        return Err(ValidationError::BodyTooShort);
    }
    Ok(())
}

pub fn validate_comment(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("test.user+tag@sub.example.co.uk").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("invalid"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@host"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a b@c.com"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("secret1").is_ok());
        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(validate_password("12345"), Err(ValidationError::PasswordTooShort));
    }

    #[test]
    fn test_registration_confirmation() {
        assert!(validate_registration("a@b.com", "secret1", "secret1").is_ok());
        assert_eq!(
            validate_registration("a@b.com", "secret1", ""),
            Err(ValidationError::ConfirmRequired)
        );
        assert_eq!(
            validate_registration("a@b.com", "secret1", "secret2"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_post_lengths() {
        assert!(validate_post("Hi there", "0123456789").is_ok());
        assert_eq!(validate_post("Hi", "0123456789"), Err(ValidationError::TitleTooShort));
        assert_eq!(validate_post("Hi there", "   short   "), Err(ValidationError::BodyTooShort));
    }

    #[test]
    fn test_comment_must_have_text() {
        assert!(validate_comment("nice post").is_ok());
        assert_eq!(validate_comment("   "), Err(ValidationError::EmptyComment));
    }
}
