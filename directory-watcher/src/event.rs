//! File events from directory watching.

use std::path::PathBuf;
use std::time::Instant;

/// A write to the watched file, as delivered to the `on_change` callback.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The kind of event.
    pub kind: FileEventKind,

    /// Path reported by the notifier.
    pub path: PathBuf,

    /// 1-based count of matching events seen by this watcher.
    pub sequence: u64,

    /// When the dispatcher picked the event up.
    pub observed_at: Instant,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>, sequence: u64) -> Self {
        Self {
            kind,
            path: path.into(),
            sequence,
            observed_at: Instant::now(),
        }
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File was modified.
    Modified,

    /// File was deleted.
    Deleted,

    /// File was renamed (old path).
    RenamedFrom,

    /// File was renamed (new path).
    RenamedTo,

    /// File metadata changed.
    MetadataChanged,

    /// Access time changed.
    Accessed,

    /// Unknown event type.
    Unknown,
}

impl FileEventKind {
    /// Whether this kind leaves new content at the event path.
    ///
    /// Covers in-place writes as well as the create and rename-into-place
    /// steps of replace-on-write saves.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::RenamedTo)
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                notify::event::ModifyKind::Name(rename) => match rename {
                    notify::event::RenameMode::From => Self::RenamedFrom,
                    notify::event::RenameMode::To => Self::RenamedTo,
                    // Both-ends and unknown renames are reported against the
                    // destination by the time the dispatcher sees them.
                    _ => Self::RenamedTo,
                },
                notify::event::ModifyKind::Metadata(_) => Self::MetadataChanged,
                _ => Self::Modified,
            },
            notify::EventKind::Remove(_) => Self::Deleted,
            notify::EventKind::Access(_) => Self::Accessed,
            _ => Self::Unknown,
        }
    }
}
