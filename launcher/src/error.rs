//! Error types for the launcher.

use relaunch_directory_watcher::WatcherError;
use thiserror::Error;

/// Result type alias for launcher operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Errors that can occur while launching or supervising the application.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Watcher error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The application failed. Never treated as a clean exit.
    #[error(transparent)]
    Application(#[from] anyhow::Error),
}

impl LaunchError {
    /// Whether this error means file watching is not available here.
    pub fn is_watch_unavailable(&self) -> bool {
        matches!(self, Self::Watcher(e) if e.is_unavailable())
    }
}
