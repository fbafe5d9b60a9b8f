use super::ThemeName;
use crate::error::ThemeError;
use crate::generation::Generation;
use local_storage::{KeyValueStore, SharedStore};
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_THEME_KEY: &str = "examapp.theme";

pub struct ThemeStore {
    storage: SharedStore,
    key: String,
    state: watch::Sender<ThemeName>,
    // Bumped by every explicit selection so a slow restore cannot undo it
    generation: Generation,
}

impl ThemeStore {
    pub fn new(storage: SharedStore, key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ThemeName::default());
        Self {
            storage,
            key: key.into(),
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeName> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ThemeName {
        *self.state.borrow()
    }

    /// Load the persisted selection. Unknown values and storage failures
    /// keep the current selection.
    pub async fn restore(&self) -> ThemeName {
        let ticket = self.generation.begin();
        let loaded = self.storage.get(&self.key).await;

        if !self.generation.is_current(ticket) {
            debug!("Discarding persisted theme; a selection was made meanwhile");
            return self.current();
        }

        match loaded {
            Ok(Some(raw)) => match raw.parse::<ThemeName>() {
                Ok(name) => {
                    self.state.send_replace(name);
                    debug!(theme = %name, "Theme restored");
                }
                Err(e) => warn!(error = %e, "Ignoring persisted theme"),
            },
            Ok(None) => debug!("No persisted theme"),
            Err(e) => warn!(error = %e, "Failed to read persisted theme"),
        }
        self.current()
    }

    /// Select `name` in memory and on disk. A failed write keeps the
    /// in-memory selection.
    pub async fn set(&self, name: ThemeName) {
        self.generation.invalidate();
        self.state.send_replace(name);
        if let Err(e) = self.storage.set(&self.key, name.as_str()).await {
            warn!(error = %e, theme = %name, "Failed to persist theme");
        }
    }

    /// Select a theme by identifier; unknown identifiers leave the
    /// previous selection in place.
    pub async fn set_by_name(&self, name: &str) -> Result<ThemeName, ThemeError> {
        let parsed = name.parse::<ThemeName>()?;
        self.set(parsed).await;
        Ok(parsed)
    }
}
