//! Error types for the directory watcher.

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The notification facility could not be initialised on this platform.
    ///
    /// Callers are expected to recover by running without monitoring.
    #[error("file watching unavailable: {0}")]
    WatchUnavailable(String),

    /// Directory not found.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// `stop` was called on a watcher that has already been stopped.
    #[error("watcher already stopped")]
    AlreadyStopped,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WatcherError {
    /// Whether this error means the caller should fall back to an
    /// unmonitored run rather than abort.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::WatchUnavailable(_))
    }

    /// Classify an error raised while creating a notifier or registering a
    /// watch.
    pub(crate) fn from_setup(err: notify::Error, directory: &std::path::Path) -> Self {
        match err.kind {
            notify::ErrorKind::PathNotFound => {
                Self::DirectoryNotFound(directory.display().to_string())
            }
            notify::ErrorKind::InvalidConfig(_) => Self::Config(err.to_string()),
            _ => Self::WatchUnavailable(err.to_string()),
        }
    }
}
