//! Shared fixtures for the feed-sync integration tests

#![allow(dead_code)]

use feed_sync::platform::memory::{InMemoryIdentityProvider, InMemoryPostCollection};
use feed_sync::posts::{PostStoreOptions, SyncMode};
use feed_sync::{ClientOptions, FeedClient, Platform};
use local_storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
use std::sync::Arc;

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";

/// Everything a test needs to poke at from outside the client
pub struct Harness {
    pub identity: Arc<InMemoryIdentityProvider>,
    pub collection: Arc<InMemoryPostCollection>,
    pub storage: MemoryStore,
    pub client: FeedClient,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mode(SyncMode::Refetch)
    }

    pub fn with_mode(mode: SyncMode) -> Self {
        Self::build(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryPostCollection::new()),
            MemoryStore::new(),
            mode,
        )
    }

    pub fn build(
        identity: Arc<InMemoryIdentityProvider>,
        collection: Arc<InMemoryPostCollection>,
        storage: MemoryStore,
        mode: SyncMode,
    ) -> Self {
        let platform = Platform {
            identity: identity.clone(),
            posts: collection.clone(),
            storage: Arc::new(storage.clone()),
        };
        let options = ClientOptions {
            posts: PostStoreOptions {
                mode,
                ..PostStoreOptions::default()
            },
            ..ClientOptions::default()
        };

        Self {
            identity,
            collection,
            storage,
            client: FeedClient::new(platform, options),
        }
    }

    /// Same platform and storage, fresh client: a simulated relaunch
    pub fn relaunch(&self) -> Self {
        Self::build(
            self.identity.clone(),
            self.collection.clone(),
            self.storage.clone(),
            SyncMode::Refetch,
        )
    }

    pub async fn signed_in() -> Self {
        let harness = Self::new();
        harness
            .client
            .register(EMAIL, PASSWORD)
            .await
            .expect("registration should succeed");
        harness
    }
}

/// Storage backend whose every call fails
pub struct BrokenStore;

#[async_trait::async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("disk unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("disk unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("disk unavailable".to_string()))
    }
}

/// Memory store whose reads resolve late with the value seen at call time
pub struct SlowReadStore {
    pub inner: MemoryStore,
    pub delay: std::time::Duration,
}

#[async_trait::async_trait]
impl KeyValueStore for SlowReadStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self.inner.get(key).await;
        tokio::time::sleep(self.delay).await;
        value
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key).await
    }
}
