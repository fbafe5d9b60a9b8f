//! Boundary to the external managed platform
//!
//! The client owns no backend. Identity, the "posts" document collection and
//! the device media picker are reached through these traits; concrete SDK
//! bindings live outside this crate. [`memory`] provides in-process
//! implementations used by tests and the `feed-sync` binary.

pub mod memory;

use crate::domain::{Comment, NewPostDocument, PostDocument, PostUpdate};
use base64::Engine;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Provider error codes as emitted by the identity platform
pub mod codes {
    pub const USER_NOT_FOUND: &str = "auth/user-not-found";
    pub const WRONG_PASSWORD: &str = "auth/wrong-password";
    pub const INVALID_EMAIL: &str = "auth/invalid-email";
    pub const TOO_MANY_REQUESTS: &str = "auth/too-many-requests";
    pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
    pub const WEAK_PASSWORD: &str = "auth/weak-password";
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
    /// Raised locally when a provider call exceeds its time budget
    pub const TIMEOUT: &str = "client/timeout";
}

/// Raw identity-provider failure. Only the session store looks inside it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Remote document-collection failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Account as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccount {
    pub uid: String,
    pub email: String,
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError>;

    async fn register(&self, email: &str, password: &str)
        -> Result<ProviderAccount, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Access token of the signed-in account, if any
    async fn current_token(&self) -> Result<Option<String>, ProviderError>;

    /// Account the provider itself restored on relaunch, if any
    async fn restore(&self) -> Result<Option<ProviderAccount>, ProviderError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;
}

/// The remote "posts" collection
#[async_trait::async_trait]
pub trait PostCollection: Send + Sync {
    /// Whole-collection read
    async fn fetch_all(&self) -> Result<Vec<PostDocument>, RemoteError>;

    /// Append a document; returns the generated id
    async fn create(&self, document: NewPostDocument) -> Result<String, RemoteError>;

    /// Overwrite title and body
    async fn update_fields(&self, id: &str, update: &PostUpdate) -> Result<(), RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;

    /// Array-union on `likedBy`
    async fn add_liker(&self, id: &str, user_id: &str) -> Result<(), RemoteError>;

    /// Array-remove on `likedBy`
    async fn remove_liker(&self, id: &str, user_id: &str) -> Result<(), RemoteError>;

    /// Replace the embedded comment array
    async fn replace_comments(&self, id: &str, comments: Vec<Comment>) -> Result<(), RemoteError>;
}

/// Image payload returned by the device picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// `data:` URI suitable for an avatar URL
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[async_trait::async_trait]
pub trait MediaPicker: Send + Sync {
    /// `Ok(None)` when the user cancels
    async fn pick_image(&self) -> Result<Option<EncodedImage>, ProviderError>;
}

/// Run a remote collection call within `budget`
pub(crate) async fn remote_call<T, F>(budget: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout(budget)),
    }
}

/// Run an identity provider call within `budget`
pub(crate) async fn provider_call<T, F>(budget: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::new(
            codes::TIMEOUT,
            format!("provider call exceeded {:?}", budget),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_encoding() {
        let image = EncodedImage::new("image/png", vec![0x89, b'P', b'N', b'G']);
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_remote_call_times_out() {
        let result: Result<(), RemoteError> = remote_call(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(RemoteError::Timeout(Duration::from_millis(10))));
    }

    #[tokio::test]
    async fn test_provider_call_timeout_uses_local_code() {
        let result: Result<(), ProviderError> = provider_call(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err().code, codes::TIMEOUT);
    }

    #[test]
    fn test_remote_call_passes_through_fast_results() {
        let result = tokio_test::block_on(remote_call(Duration::from_secs(1), async {
            Err::<(), _>(RemoteError::NotFound("p1".to_string()))
        }));

        assert_eq!(result, Err(RemoteError::NotFound("p1".to_string())));
    }
}
