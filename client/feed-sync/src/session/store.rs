use crate::domain::{Session, User};
use crate::error::{AuthError, AuthOperation, AuthResult};
use crate::generation::Generation;
use crate::platform::{provider_call, IdentityProvider, MediaPicker, ProviderAccount, ProviderError};
use crate::validators;
use local_storage::{load_json, store_json, KeyValueStore, SharedStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_SESSION_KEY: &str = "examapp.session";

/// What dependent UI should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup window: neither authenticated nor unauthenticated UI
    Bootstrapping,
    SignedOut,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub is_bootstrapping: bool,
    /// User-facing message of the last failed auth operation
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            is_bootstrapping: true,
            error: None,
        }
    }
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn status(&self) -> AuthStatus {
        if self.is_bootstrapping {
            AuthStatus::Bootstrapping
        } else if self.session.is_some() {
            AuthStatus::SignedIn
        } else {
            AuthStatus::SignedOut
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStoreOptions {
    /// Storage key of the serialized session
    pub session_key: String,
    /// Budget for each identity provider call
    pub remote_timeout: Duration,
}

impl Default for SessionStoreOptions {
    fn default() -> Self {
        Self {
            session_key: DEFAULT_SESSION_KEY.to_string(),
            remote_timeout: Duration::from_secs(10),
        }
    }
}

/// Owns the session record. Consumers observe it through [`SessionStore::subscribe`].
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    storage: SharedStore,
    options: SessionStoreOptions,
    state: watch::Sender<SessionState>,
    // Bumped by every sign-in/sign-out so a slow bootstrap cannot clobber it
    generation: Generation,
}

impl SessionStore {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        storage: SharedStore,
        options: SessionStoreOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            storage,
            options,
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.state.borrow().is_bootstrapping
    }

    /// Restore the session at startup.
    ///
    /// Persisted data wins; without it the provider's own restored account
    /// is used. Bootstrapping ends whatever happens, failures only log.
    pub async fn bootstrap(&self) {
        let ticket = self.generation.begin();

        let key = &self.options.session_key;
        let persisted = match load_json::<Session>(self.storage.as_ref(), key).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                None
            }
        };

        let (restored, from_provider) = match persisted {
            Some(session) => (Some(session), false),
            None => (self.restore_from_provider().await, true),
        };

        // A sign-in or sign-out that landed meanwhile owns both memory and storage
        let applied = self.generation.is_current(ticket);
        if applied && from_provider {
            if let Some(session) = &restored {
                self.persist(Some(session)).await;
            }
        }

        self.state.send_modify(|state| {
            if applied {
                state.session = restored;
            }
            state.is_bootstrapping = false;
        });

        let signed_in = self.state.borrow().session.is_some();
        info!(signed_in, applied, "Session bootstrap complete");
    }

    async fn restore_from_provider(&self) -> Option<Session> {
        let timeout = self.options.remote_timeout;
        let account = match provider_call(timeout, self.provider.restore()).await {
            Ok(Some(account)) => account,
            Ok(None) => return None,
            Err(e) => {
                warn!(code = %e.code, "Provider restore failed");
                return None;
            }
        };

        match provider_call(timeout, self.provider.current_token()).await {
            Ok(Some(token)) => Some(Session {
                user: User::from_email(account.uid, account.email),
                token,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(code = %e.code, "Provider token lookup failed during restore");
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let result: AuthResult<User> = async {
            validators::validate_credentials(email, password)?;

            let account = provider_call(
                self.options.remote_timeout,
                self.provider.sign_in(email, password),
            )
            .await
            .map_err(|e| translate(AuthOperation::Login, &e))?;

            self.establish(AuthOperation::Login, account).await
        }
        .await;
        self.record(result)
    }

    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        let result = match validators::validate_credentials(email, password) {
            Ok(()) => self.create_account(email, password).await,
            Err(e) => Err(e.into()),
        };
        self.record(result)
    }

    /// Registration form path: the confirmation must match before the
    /// provider is contacted.
    pub async fn register_confirmed(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> AuthResult<User> {
        let result = match validators::validate_registration(email, password, confirm) {
            Ok(()) => self.create_account(email, password).await,
            Err(e) => Err(e.into()),
        };
        self.record(result)
    }

    async fn create_account(&self, email: &str, password: &str) -> AuthResult<User> {
        let account = provider_call(
            self.options.remote_timeout,
            self.provider.register(email, password),
        )
        .await
        .map_err(|e| translate(AuthOperation::Register, &e))?;

        self.establish(AuthOperation::Register, account).await
    }

    /// End the session. Local state is cleared even if the provider call fails.
    pub async fn logout(&self) {
        if let Err(e) = provider_call(self.options.remote_timeout, self.provider.sign_out()).await {
            warn!(code = %e.code, "Provider sign-out failed; clearing local session anyway");
        }

        self.generation.invalidate();
        self.state.send_modify(|state| {
            state.session = None;
            state.is_bootstrapping = false;
            state.error = None;
        });
        self.persist(None).await;
        info!("Signed out");
    }

    pub async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let result: AuthResult<()> = async {
            validators::validate_email(email)?;

            provider_call(
                self.options.remote_timeout,
                self.provider.send_password_reset(email),
            )
            .await
            .map_err(|e| translate(AuthOperation::PasswordReset, &e))?;

            debug!("Password reset email requested");
            Ok(())
        }
        .await;
        self.record(result)
    }

    /// Re-read the access token from the provider and store it
    pub async fn refresh_token(&self) -> AuthResult<Option<String>> {
        if self.state.borrow().session.is_none() {
            return Err(AuthError::NotAuthenticated);
        }

        let token = provider_call(self.options.remote_timeout, self.provider.current_token())
            .await
            .map_err(|e| translate(AuthOperation::TokenRefresh, &e))?;

        let Some(token) = token else {
            return Ok(None);
        };

        let updated = self.update_session(|session| session.token = token.clone());
        if let Some(session) = &updated {
            self.persist(Some(session)).await;
        }
        Ok(updated.map(|_| token))
    }

    /// Replace the avatar with an image from the device picker.
    /// Returns `Ok(None)` when the pick is cancelled.
    pub async fn update_profile_image(&self, picker: &dyn MediaPicker) -> AuthResult<Option<User>> {
        if self.state.borrow().session.is_none() {
            return Err(AuthError::NotAuthenticated);
        }

        let image = picker
            .pick_image()
            .await
            .map_err(|e| translate(AuthOperation::ProfileUpdate, &e))?;
        let Some(image) = image else {
            debug!("Profile image pick cancelled");
            return Ok(None);
        };

        let avatar_url = image.to_data_uri();
        let updated = self
            .update_session(|session| session.user.avatar_url = Some(avatar_url))
            .ok_or(AuthError::NotAuthenticated)?;
        self.persist(Some(&updated)).await;

        info!(user_id = %updated.user.id, "Profile image updated");
        Ok(Some(updated.user))
    }

    async fn establish(&self, operation: AuthOperation, account: ProviderAccount) -> AuthResult<User> {
        let token = provider_call(self.options.remote_timeout, self.provider.current_token())
            .await
            .map_err(|e| translate(operation, &e))?
            .ok_or_else(|| {
                translate(
                    operation,
                    &ProviderError::new("client/missing-token", "provider returned no token"),
                )
            })?;

        let session = Session {
            user: User::from_email(account.uid, account.email),
            token,
        };

        self.generation.invalidate();
        self.state.send_modify(|state| {
            state.session = Some(session.clone());
            state.is_bootstrapping = false;
            state.error = None;
        });
        self.persist(Some(&session)).await;

        info!(user_id = %session.user.id, ?operation, "Session established");
        Ok(session.user)
    }

    /// Mirror the outcome of a user-initiated auth operation into the error slot
    fn record<T>(&self, result: AuthResult<T>) -> AuthResult<T> {
        let message = result.as_ref().err().map(ToString::to_string);
        self.state.send_if_modified(|state| {
            if state.error == message {
                return false;
            }
            state.error = message;
            true
        });
        result
    }

    /// Apply `change` to the current session, if any, and return the result
    fn update_session(&self, change: impl FnOnce(&mut Session)) -> Option<Session> {
        let mut updated = None;
        self.state.send_if_modified(|state| match state.session.as_mut() {
            Some(session) => {
                change(session);
                updated = Some(session.clone());
                true
            }
            None => false,
        });
        updated
    }

    /// Storage failures degrade to in-memory state
    async fn persist(&self, session: Option<&Session>) {
        let key = &self.options.session_key;
        let result = match session {
            Some(session) => store_json(self.storage.as_ref(), key, session).await,
            None => self.storage.remove(key).await,
        };
        if let Err(e) = result {
            warn!(error = %e, key = %key, "Failed to persist session");
        }
    }
}

fn translate(operation: AuthOperation, err: &ProviderError) -> AuthError {
    warn!(?operation, code = %err.code, "Identity provider rejected request");
    AuthError::from_provider(operation, err)
}
