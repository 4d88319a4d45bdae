//! Configuration types for directory watching.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// The directory to watch and the single file of interest inside it.
///
/// The directory is watched rather than the file itself: editors that save by
/// writing a temporary file and renaming it over the original would otherwise
/// invalidate the watch after the first save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Directory containing the file.
    pub directory: PathBuf,

    /// File name compared against the last component of every event path.
    pub file_name: OsString,

    /// Which notification backend to use.
    pub backend: WatchBackend,
}

impl WatchTarget {
    /// Create a new watch target using the native backend.
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<OsString>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
            backend: WatchBackend::default(),
        }
    }

    /// Build a target from a path to the file itself.
    ///
    /// A bare file name resolves against the current directory.
    pub fn for_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .ok_or_else(|| WatcherError::Config(format!("not a file path: {}", path.display())))?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self::new(directory, file_name))
    }

    /// Set the watch backend.
    pub fn with_backend(mut self, backend: WatchBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Check that the directory exists and is a directory.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(WatcherError::Config("target file name is empty".to_string()));
        }

        if !self.directory.exists() {
            return Err(WatcherError::DirectoryNotFound(
                self.directory.display().to_string(),
            ));
        }

        if !self.directory.is_dir() {
            return Err(WatcherError::Config(format!(
                "Path is not a directory: {}",
                self.directory.display()
            )));
        }

        Ok(())
    }

    /// Exact comparison of a path's final component with the target name.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name() == Some(self.file_name.as_os_str())
    }

    /// Full path of the watched file.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Which notification facility to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatchBackend {
    /// The platform's native notifier (inotify, FSEvents, ...).
    #[default]
    Native,

    /// Periodic polling, for filesystems that deliver no native events.
    Poll {
        /// Poll interval in milliseconds.
        interval_ms: u64,
    },

    /// Watching is switched off; starting a watcher reports it unavailable.
    Disabled,
}

impl WatchBackend {
    /// Polling backend with the given interval.
    pub fn poll(interval: Duration) -> Self {
        Self::Poll {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
