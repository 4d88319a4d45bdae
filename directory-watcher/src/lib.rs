//! # Directory Watcher
//!
//! This crate watches a single directory and reports writes to one file
//! inside it. It is the change source for the `relaunch` lifecycle loop.
//!
//! ## Features
//!
//! - **Directory-level watching**: survives editors that replace the file on
//!   save (write to a swap file, then rename over the original)
//! - **Exact file name matching**: events for any other file are dropped
//! - **Deterministic shutdown**: `stop` joins the dispatcher thread
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchTarget ──► notify backend ──► dispatcher thread           │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  WatchBackend                    FileEventKind ──► on_change    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod watcher;

pub use config::{WatchBackend, WatchTarget};
pub use error::{Result, WatcherError};
pub use event::{ChangeEvent, FileEventKind};
pub use watcher::FileChangeWatcher;
