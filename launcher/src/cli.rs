//! Command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use relaunch_directory_watcher::WatchBackend;

use crate::config::LaunchConfig;
use crate::error::Result;

/// Run an application and restart it whenever its source file changes.
#[derive(Debug, Parser)]
#[command(name = "relaunch", version, about)]
pub struct Cli {
    /// Configuration file (default: ./relaunch.toml if present).
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Module to run; its source file `<MODULE>.py` is watched.
    #[arg(long, short = 'm')]
    pub module: Option<String>,

    /// Directory containing the source file.
    #[arg(long, short = 'd', value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Run once without watching for changes.
    #[arg(long, conflicts_with = "poll")]
    pub no_watch: bool,

    /// Poll for changes every MS milliseconds instead of using native events.
    #[arg(long, value_name = "MS")]
    pub poll: Option<u64>,

    /// Command to run instead of `<interpreter> <MODULE>.py`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Resolve the configuration: file (explicit or default), then flags.
    pub fn into_config(self) -> Result<LaunchConfig> {
        let mut config = match &self.config {
            Some(path) => LaunchConfig::load(path)?,
            None => LaunchConfig::load_or_default(".")?,
        };

        if let Some(module) = self.module {
            config.module = module;
        }
        if let Some(dir) = self.dir {
            config.watch_dir = dir;
        }
        if self.no_watch {
            config.backend = WatchBackend::Disabled;
        } else if let Some(ms) = self.poll {
            config.backend = WatchBackend::poll(Duration::from_millis(ms));
        }
        if !self.command.is_empty() {
            config.command = Some(self.command);
        }

        config.validate()?;
        Ok(config)
    }
}
