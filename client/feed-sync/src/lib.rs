//! Client-side state for the Nova feed app
//!
//! The app has no backend of its own: identity, the "posts" document
//! collection and device storage are external. This crate keeps local state
//! consistent with them:
//! - [`session::SessionStore`]: authenticated identity and bootstrap status
//! - [`posts::PostStore`]: cached feed plus create/update/delete/like/comment
//! - [`theme::ThemeStore`]: persisted theme selection
//!
//! Stores publish their state over `tokio::sync::watch`; [`app::FeedClient`]
//! wires them to a [`app::Platform`].

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod generation;
pub mod platform;
pub mod posts;
pub mod session;
pub mod telemetry;
pub mod theme;
pub mod validators;

pub use app::{ClientOptions, FeedClient, Platform};
pub use error::{AuthError, AuthErrorKind, PostError, ThemeError};
