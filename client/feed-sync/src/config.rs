//! Configuration management for the feed client
//!
//! Loads configuration from environment variables.

use crate::posts::SyncMode;
use crate::session::DEFAULT_SESSION_KEY;
use crate::theme::DEFAULT_THEME_KEY;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Device-local storage
    pub storage: StorageConfig,
    /// Remote synchronization
    pub sync: SyncConfig,
    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// JSON file backing the key-value store
    pub path: PathBuf,
    /// Key of the serialized session
    pub session_key: String,
    /// Key of the selected theme
    pub theme_key: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    /// Budget for every remote call, in milliseconds
    pub remote_timeout_ms: u64,
}

impl SyncConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

// Default values
fn default_storage_path() -> PathBuf {
    PathBuf::from(".feed-sync").join("state.json")
}

fn default_remote_timeout_ms() -> u64 {
    10_000
}

fn default_log_filter() -> String {
    "info,feed_sync=debug".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        };

        let storage = StorageConfig {
            path: std::env::var("FEED_SYNC_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_storage_path()),
            session_key: std::env::var("FEED_SYNC_SESSION_KEY")
                .unwrap_or_else(|_| DEFAULT_SESSION_KEY.to_string()),
            theme_key: std::env::var("FEED_SYNC_THEME_KEY")
                .unwrap_or_else(|_| DEFAULT_THEME_KEY.to_string()),
        };

        let mode = match std::env::var("FEED_SYNC_MODE") {
            Ok(raw) => match SyncMode::from_name(&raw) {
                Some(mode) => mode,
                None => bail!("FEED_SYNC_MODE must be 'refetch' or 'optimistic', got '{}'", raw),
            },
            Err(_) => SyncMode::default(),
        };

        let remote_timeout_ms = match std::env::var("FEED_SYNC_REMOTE_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("FEED_SYNC_REMOTE_TIMEOUT_MS must be a number of milliseconds")?,
            Err(_) => default_remote_timeout_ms(),
        };
        if remote_timeout_ms == 0 {
            bail!("FEED_SYNC_REMOTE_TIMEOUT_MS must be greater than zero");
        }

        let logging = LoggingConfig {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_filter()),
            format: match std::env::var("FEED_SYNC_LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            app,
            storage,
            sync: SyncConfig {
                mode,
                remote_timeout_ms,
            },
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "APP_ENV",
        "FEED_SYNC_STORAGE_PATH",
        "FEED_SYNC_SESSION_KEY",
        "FEED_SYNC_THEME_KEY",
        "FEED_SYNC_MODE",
        "FEED_SYNC_REMOTE_TIMEOUT_MS",
        "FEED_SYNC_LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.storage.session_key, "examapp.session");
        assert_eq!(config.storage.theme_key, "examapp.theme");
        assert_eq!(config.sync.mode, SyncMode::Refetch);
        assert_eq!(config.sync.remote_timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("FEED_SYNC_MODE", "optimistic");
        std::env::set_var("FEED_SYNC_REMOTE_TIMEOUT_MS", "2500");
        std::env::set_var("FEED_SYNC_LOG_FORMAT", "json");
        std::env::set_var("FEED_SYNC_STORAGE_PATH", "/tmp/feed.json");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.sync.mode, SyncMode::Optimistic);
        assert_eq!(config.sync.remote_timeout(), Duration::from_millis(2500));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/feed.json"));
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        std::env::set_var("FEED_SYNC_MODE", "eventual");
        assert!(Config::from_env().is_err());

        clear_env();
        std::env::set_var("FEED_SYNC_REMOTE_TIMEOUT_MS", "soon");
        assert!(Config::from_env().is_err());

        clear_env();
        std::env::set_var("FEED_SYNC_REMOTE_TIMEOUT_MS", "0");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
