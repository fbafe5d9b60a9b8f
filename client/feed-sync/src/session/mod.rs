//! Session store: authenticated identity plus bootstrap status

mod store;

pub use store::{AuthStatus, SessionState, SessionStore, SessionStoreOptions, DEFAULT_SESSION_KEY};
