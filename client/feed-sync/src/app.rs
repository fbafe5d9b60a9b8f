//! Composition root
//!
//! Wires the three stores to one platform. There are no ambient
//! singletons: the presentation layer receives a [`FeedClient`] and
//! subscribes to whichever store it renders.

use crate::config::Config;
use crate::domain::User;
use crate::error::AuthResult;
use crate::platform::{IdentityProvider, PostCollection};
use crate::posts::{PostStore, PostStoreOptions};
use crate::session::{SessionStore, SessionStoreOptions};
use crate::theme::{ThemeName, ThemeStore, DEFAULT_THEME_KEY};
use local_storage::SharedStore;
use std::sync::Arc;
use tracing::{info, warn};

/// External capabilities the client is built on
#[derive(Clone)]
pub struct Platform {
    pub identity: Arc<dyn IdentityProvider>,
    pub posts: Arc<dyn PostCollection>,
    pub storage: SharedStore,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub session: SessionStoreOptions,
    pub posts: PostStoreOptions,
    pub theme_key: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            session: SessionStoreOptions::default(),
            posts: PostStoreOptions::default(),
            theme_key: DEFAULT_THEME_KEY.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &Config) -> Self {
        let remote_timeout = config.sync.remote_timeout();
        Self {
            session: SessionStoreOptions {
                session_key: config.storage.session_key.clone(),
                remote_timeout,
            },
            posts: PostStoreOptions {
                mode: config.sync.mode,
                remote_timeout,
            },
            theme_key: config.storage.theme_key.clone(),
        }
    }
}

pub struct FeedClient {
    session: SessionStore,
    posts: PostStore,
    theme: ThemeStore,
}

impl FeedClient {
    pub fn new(platform: Platform, options: ClientOptions) -> Self {
        let session = SessionStore::new(
            platform.identity,
            Arc::clone(&platform.storage),
            options.session,
        );
        let posts = PostStore::new(platform.posts, session.subscribe(), options.posts);
        let theme = ThemeStore::new(platform.storage, options.theme_key);

        Self {
            session,
            posts,
            theme,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn posts(&self) -> &PostStore {
        &self.posts
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    /// Restore session and theme concurrently, then load the feed.
    /// Never fails: every step degrades to defaults.
    pub async fn bootstrap(&self) {
        let ((), theme) = tokio::join!(self.session.bootstrap(), self.theme.restore());
        info!(theme = %theme, "Client bootstrapped");

        self.reload_feed().await;
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let user = self.session.login(email, password).await?;
        self.reload_feed().await;
        Ok(user)
    }

    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        let user = self.session.register(email, password).await?;
        self.reload_feed().await;
        Ok(user)
    }

    pub async fn register_confirmed(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> AuthResult<User> {
        let user = self
            .session
            .register_confirmed(email, password, confirm)
            .await?;
        self.reload_feed().await;
        Ok(user)
    }

    /// End the session and re-project the feed for a signed-out viewer
    pub async fn logout(&self) {
        self.session.logout().await;
        self.reload_feed().await;
    }

    pub async fn set_theme(&self, name: ThemeName) {
        self.theme.set(name).await;
    }

    /// Viewer changed: drop in-flight loads and fetch again
    async fn reload_feed(&self) {
        self.posts.invalidate();
        if let Err(e) = self.posts.refresh().await {
            warn!(error = %e, "Feed reload failed");
        }
    }
}
