//! In-process platform
//!
//! Behaves like the managed platform closely enough for the stores: same
//! error codes, server-assigned timestamps, array-union semantics on
//! `likedBy`. Failure switches let tests drive the error paths.

use super::{
    codes, EncodedImage, IdentityProvider, MediaPicker, PostCollection, ProviderAccount,
    ProviderError, RemoteError,
};
use crate::domain::{Comment, NewPostDocument, PostDocument, PostUpdate};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Failed sign-ins tolerated before the provider starts rate limiting
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Account {
    uid: String,
    password: String,
}

struct SignedIn {
    account: ProviderAccount,
    token: String,
}

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    signed_in: Mutex<Option<SignedIn>>,
    failed_attempts: Mutex<u32>,
    next_failure: Mutex<Option<ProviderError>>,
    reset_requests: Mutex<Vec<String>>,
    token_delay: Mutex<Option<Duration>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that already holds a signed-in account, as after a relaunch
    pub fn with_restored_account(email: &str, password: &str) -> Self {
        let provider = Self::new();
        let account = provider.insert_account(email, password);
        provider.start_session(account);
        provider
    }

    /// Make the next call fail with `code`
    pub fn fail_next(&self, code: &str) {
        *lock(&self.next_failure) = Some(ProviderError::new(code, "injected failure"));
    }

    /// Emails that were sent a reset link
    pub fn reset_requests(&self) -> Vec<String> {
        lock(&self.reset_requests).clone()
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.signed_in).is_some()
    }

    /// Delay token lookups. The token is read when the call starts, so a
    /// delayed lookup can return a token that was revoked meanwhile.
    pub fn set_token_delay(&self, delay: Option<Duration>) {
        *lock(&self.token_delay) = delay;
    }

    fn take_failure(&self) -> Result<(), ProviderError> {
        match lock(&self.next_failure).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn insert_account(&self, email: &str, password: &str) -> ProviderAccount {
        let uid = Uuid::new_v4().simple().to_string();
        lock(&self.accounts).insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        ProviderAccount {
            uid,
            email: email.to_string(),
        }
    }

    fn start_session(&self, account: ProviderAccount) {
        let token = format!("tok-{}", Uuid::new_v4().simple());
        *lock(&self.signed_in) = Some(SignedIn { account, token });
    }

    fn check_email(email: &str) -> Result<(), ProviderError> {
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if well_formed {
            Ok(())
        } else {
            Err(ProviderError::new(codes::INVALID_EMAIL, "badly formatted email"))
        }
    }

    fn record_failure(&self, err: ProviderError) -> ProviderError {
        *lock(&self.failed_attempts) += 1;
        err
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderAccount, ProviderError> {
        self.take_failure()?;
        Self::check_email(email)?;

        if *lock(&self.failed_attempts) >= MAX_FAILED_ATTEMPTS {
            return Err(ProviderError::new(
                codes::TOO_MANY_REQUESTS,
                "access temporarily disabled",
            ));
        }

        let account = {
            let accounts = lock(&self.accounts);
            match accounts.get(email) {
                None => None,
                Some(account) if account.password != password => {
                    Some(Err(ProviderError::new(codes::WRONG_PASSWORD, "wrong password")))
                }
                Some(account) => Some(Ok(ProviderAccount {
                    uid: account.uid.clone(),
                    email: email.to_string(),
                })),
            }
        };

        match account {
            None => Err(self.record_failure(ProviderError::new(
                codes::USER_NOT_FOUND,
                "no user record",
            ))),
            Some(Err(err)) => Err(self.record_failure(err)),
            Some(Ok(account)) => {
                *lock(&self.failed_attempts) = 0;
                self.start_session(account.clone());
                debug!(uid = %account.uid, "Provider sign-in");
                Ok(account)
            }
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderAccount, ProviderError> {
        self.take_failure()?;
        Self::check_email(email)?;

        if lock(&self.accounts).contains_key(email) {
            return Err(ProviderError::new(
                codes::EMAIL_ALREADY_IN_USE,
                "email already in use",
            ));
        }
        if password.chars().count() < 6 {
            return Err(ProviderError::new(
                codes::WEAK_PASSWORD,
                "password should be at least 6 characters",
            ));
        }

        let account = self.insert_account(email, password);
        self.start_session(account.clone());
        debug!(uid = %account.uid, "Provider registration");
        Ok(account)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.take_failure()?;
        *lock(&self.signed_in) = None;
        Ok(())
    }

    async fn current_token(&self) -> Result<Option<String>, ProviderError> {
        self.take_failure()?;
        let token = lock(&self.signed_in).as_ref().map(|s| s.token.clone());
        let delay = *lock(&self.token_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(token)
    }

    async fn restore(&self) -> Result<Option<ProviderAccount>, ProviderError> {
        self.take_failure()?;
        Ok(lock(&self.signed_in).as_ref().map(|s| s.account.clone()))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.take_failure()?;
        Self::check_email(email)?;
        if !lock(&self.accounts).contains_key(email) {
            return Err(ProviderError::new(codes::USER_NOT_FOUND, "no user record"));
        }
        lock(&self.reset_requests).push(email.to_string());
        Ok(())
    }
}

pub struct InMemoryPostCollection {
    documents: Mutex<Vec<PostDocument>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    write_delay: Mutex<Option<Duration>>,
}

impl Default for InMemoryPostCollection {
    fn default() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            last_timestamp: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            write_delay: Mutex::new(None),
        }
    }
}

impl InMemoryPostCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay delivery of fetch results. The snapshot is still taken when
    /// the fetch starts, so a delayed fetch returns old data late.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *lock(&self.fetch_delay) = delay;
    }

    /// Delay the outcome of writes. Whether a write fails is decided when
    /// it starts, so flipping the failure switch meanwhile does not save it.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *lock(&self.write_delay) = delay;
    }

    /// Direct read of one document, bypassing failure switches
    pub fn document(&self, id: &str) -> Option<PostDocument> {
        lock(&self.documents).iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.documents).is_empty()
    }

    /// Server timestamps are strictly increasing
    fn server_timestamp(&self) -> DateTime<Utc> {
        let mut last = lock(&self.last_timestamp);
        let now = Utc::now();
        let next = match *last {
            Some(prev) if now <= prev => prev + ChronoDuration::milliseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    async fn check_writable(&self) -> Result<(), RemoteError> {
        let rejected = self.fail_writes.load(Ordering::SeqCst);
        let delay = *lock(&self.write_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if rejected {
            return Err(RemoteError::Request("write rejected".to_string()));
        }
        Ok(())
    }

    async fn with_document<R>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut PostDocument) -> R,
    ) -> Result<R, RemoteError> {
        self.check_writable().await?;
        let mut documents = lock(&self.documents);
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        Ok(apply(document))
    }
}

#[async_trait::async_trait]
impl PostCollection for InMemoryPostCollection {
    async fn fetch_all(&self) -> Result<Vec<PostDocument>, RemoteError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Request("read rejected".to_string()));
        }

        let snapshot = lock(&self.documents).clone();
        let delay = *lock(&self.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn create(&self, document: NewPostDocument) -> Result<String, RemoteError> {
        self.check_writable().await?;

        let id = Uuid::new_v4().simple().to_string();
        let created_at = self.server_timestamp();
        lock(&self.documents).push(PostDocument {
            id: id.clone(),
            title: document.title,
            body: document.body,
            author_id: document.author_id,
            author_name: document.author_name,
            created_at,
            liked_by: Vec::new(),
            comments: Vec::new(),
        });
        Ok(id)
    }

    async fn update_fields(&self, id: &str, update: &PostUpdate) -> Result<(), RemoteError> {
        self.with_document(id, |document| {
            document.title = update.title.clone();
            document.body = update.body.clone();
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.check_writable().await?;
        let mut documents = lock(&self.documents);
        let before = documents.len();
        documents.retain(|d| d.id != id);
        if documents.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn add_liker(&self, id: &str, user_id: &str) -> Result<(), RemoteError> {
        self.with_document(id, |document| {
            if !document.liked_by.iter().any(|uid| uid == user_id) {
                document.liked_by.push(user_id.to_string());
            }
        })
        .await
    }

    async fn remove_liker(&self, id: &str, user_id: &str) -> Result<(), RemoteError> {
        self.with_document(id, |document| {
            document.liked_by.retain(|uid| uid != user_id);
        })
        .await
    }

    async fn replace_comments(&self, id: &str, comments: Vec<Comment>) -> Result<(), RemoteError> {
        self.with_document(id, |document| {
            document.comments = comments;
        })
        .await
    }
}

/// Picker that always returns the same payload
pub struct StaticMediaPicker {
    image: Option<EncodedImage>,
}

impl StaticMediaPicker {
    pub fn new(image: Option<EncodedImage>) -> Self {
        Self { image }
    }
}

#[async_trait::async_trait]
impl MediaPicker for StaticMediaPicker {
    async fn pick_image(&self) -> Result<Option<EncodedImage>, ProviderError> {
        Ok(self.image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NewPostDocument {
        NewPostDocument {
            title: title.to_string(),
            body: "0123456789".to_string(),
            author_id: "u1".to_string(),
            author_name: "a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_error_codes() {
        let provider = InMemoryIdentityProvider::new();
        provider.register("a@b.com", "secret1").await.unwrap();

        let err = provider.sign_in("x@b.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, codes::USER_NOT_FOUND);

        let err = provider.sign_in("a@b.com", "nope123").await.unwrap_err();
        assert_eq!(err.code, codes::WRONG_PASSWORD);

        let err = provider.sign_in("not-an-email", "secret1").await.unwrap_err();
        assert_eq!(err.code, codes::INVALID_EMAIL);
    }

    #[tokio::test]
    async fn test_rate_limit_after_repeated_failures() {
        let provider = InMemoryIdentityProvider::new();
        provider.register("a@b.com", "secret1").await.unwrap();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            let _ = provider.sign_in("a@b.com", "wrong12").await;
        }

        let err = provider.sign_in("a@b.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, codes::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_weak_passwords() {
        let provider = InMemoryIdentityProvider::new();
        provider.register("a@b.com", "secret1").await.unwrap();

        let err = provider.register("a@b.com", "secret1").await.unwrap_err();
        assert_eq!(err.code, codes::EMAIL_ALREADY_IN_USE);

        let err = provider.register("c@d.com", "123").await.unwrap_err();
        assert_eq!(err.code, codes::WEAK_PASSWORD);
    }

    #[tokio::test]
    async fn test_token_follows_sign_in_state() {
        let provider = InMemoryIdentityProvider::new();
        assert!(provider.current_token().await.unwrap().is_none());

        provider.register("a@b.com", "secret1").await.unwrap();
        assert!(provider.current_token().await.unwrap().is_some());

        provider.sign_out().await.unwrap();
        assert!(provider.current_token().await.unwrap().is_none());
        assert!(provider.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_timestamps_are_strictly_increasing() {
        let collection = InMemoryPostCollection::new();
        for i in 0..5 {
            collection.create(draft(&format!("post {}", i))).await.unwrap();
        }

        let docs = collection.fetch_all().await.unwrap();
        for pair in docs.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_liker_array_union_is_idempotent() {
        let collection = InMemoryPostCollection::new();
        let id = collection.create(draft("likes")).await.unwrap();

        collection.add_liker(&id, "u2").await.unwrap();
        collection.add_liker(&id, "u2").await.unwrap();
        assert_eq!(collection.document(&id).unwrap().liked_by, vec!["u2"]);

        collection.remove_liker(&id, "u2").await.unwrap();
        assert!(collection.document(&id).unwrap().liked_by.is_empty());
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let collection = InMemoryPostCollection::new();
        collection.set_fail_writes(true);
        assert!(collection.create(draft("nope")).await.is_err());
        assert!(collection.is_empty());

        collection.set_fail_reads(true);
        assert!(collection.fetch_all().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let collection = InMemoryPostCollection::new();
        let err = collection.delete("ghost").await.unwrap_err();
        assert_eq!(err, RemoteError::NotFound("ghost".to_string()));
    }
}
