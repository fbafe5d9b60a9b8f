//! Error types for the feed client
//!
//! Provider vocabulary (status codes) stops at [`AuthError::from_provider`];
//! everything above the platform boundary works with these enums.

use crate::platform::{codes, ProviderError, RemoteError};
use crate::validators::ValidationError;
use thiserror::Error;

/// Which identity operation produced an error. Unmapped codes collapse to
/// a different generic message per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Register,
    PasswordReset,
    ProfileUpdate,
    TokenRefresh,
}

/// User-facing category of an authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NotFound,
    BadCredential,
    InvalidEmail,
    RateLimited,
    EmailInUse,
    WeakPassword,
    Validation,
    NotAuthenticated,
    Generic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No account found with this email")]
    AccountNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Too many attempts. Try later.")]
    RateLimited,

    #[error("Email already registered")]
    EmailInUse,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Login failed")]
    LoginFailed,

    #[error("Registration failed")]
    RegistrationFailed,

    #[error("Password reset failed")]
    PasswordResetFailed,

    #[error("Profile update failed")]
    ProfileUpdateFailed,

    #[error("Session refresh failed")]
    TokenRefreshFailed,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl AuthError {
    /// Translate a provider status code for `operation`
    pub fn from_provider(operation: AuthOperation, err: &ProviderError) -> Self {
        let code = err.code.as_str();
        match operation {
            AuthOperation::Login => match code {
                codes::USER_NOT_FOUND => AuthError::AccountNotFound,
                codes::WRONG_PASSWORD => AuthError::WrongPassword,
                codes::INVALID_EMAIL => AuthError::InvalidEmail,
                codes::TOO_MANY_REQUESTS => AuthError::RateLimited,
                _ => AuthError::LoginFailed,
            },
            AuthOperation::Register => match code {
                codes::EMAIL_ALREADY_IN_USE => AuthError::EmailInUse,
                codes::WEAK_PASSWORD => AuthError::WeakPassword,
                _ => AuthError::RegistrationFailed,
            },
            AuthOperation::PasswordReset => match code {
                codes::USER_NOT_FOUND => AuthError::AccountNotFound,
                codes::INVALID_EMAIL => AuthError::InvalidEmail,
                codes::TOO_MANY_REQUESTS => AuthError::RateLimited,
                _ => AuthError::PasswordResetFailed,
            },
            AuthOperation::ProfileUpdate => AuthError::ProfileUpdateFailed,
            AuthOperation::TokenRefresh => AuthError::TokenRefreshFailed,
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::AccountNotFound => AuthErrorKind::NotFound,
            AuthError::WrongPassword => AuthErrorKind::BadCredential,
            AuthError::InvalidEmail => AuthErrorKind::InvalidEmail,
            AuthError::RateLimited => AuthErrorKind::RateLimited,
            AuthError::EmailInUse => AuthErrorKind::EmailInUse,
            AuthError::WeakPassword => AuthErrorKind::WeakPassword,
            AuthError::Validation(_) => AuthErrorKind::Validation,
            AuthError::NotAuthenticated => AuthErrorKind::NotAuthenticated,
            AuthError::LoginFailed
            | AuthError::RegistrationFailed
            | AuthError::PasswordResetFailed
            | AuthError::ProfileUpdateFailed
            | AuthError::TokenRefreshFailed => AuthErrorKind::Generic,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Failed to fetch posts")]
    FetchFailed(#[source] RemoteError),

    #[error("Failed to update posts")]
    UpdateFailed(#[source] RemoteError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
pub type PostResult<T> = Result<T, PostError>;
