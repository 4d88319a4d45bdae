//! # Relaunch
//!
//! Runs an application and restarts it whenever its source file changes on
//! disk. Intended for development loops where the application has no hot
//! reload of its own.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          launch()                               │
//! │            (falls back to a single run if no watcher)           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────────────┐   change    ┌──────────────────────┐  │
//! │  │  FileChangeWatcher   │ ──────────► │ LifecycleController  │  │
//! │  │  (dispatcher thread) │             │  (caller's thread)   │  │
//! │  └──────────────────────┘             └──────────────────────┘  │
//! │                                          │ reload/start/stop    │
//! │                                          ▼                      │
//! │                                 ┌──────────────────┐            │
//! │                                 │   Application    │            │
//! │                                 └──────────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use relaunch::{LaunchConfig, ProcessApplication, launch};
//!
//! let config = LaunchConfig::load_or_default(".")?;
//! let app = Arc::new(ProcessApplication::new(config.launch_command()?)?);
//! launch(&config, app)?;
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod launch;
pub mod process;

pub use application::Application;
pub use config::{LaunchCommand, LaunchConfig};
pub use controller::{LifecycleController, RunSummary, SessionPhase};
pub use error::{LaunchError, Result};
pub use launch::{LaunchOutcome, launch};
pub use process::ProcessApplication;

// Re-export from dependencies for convenience
pub use relaunch_directory_watcher::{WatchBackend, WatchTarget, WatcherError};
