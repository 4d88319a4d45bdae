//! Configuration for the launcher.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relaunch_directory_watcher::{WatchBackend, WatchTarget};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LaunchError, Result};

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "relaunch.toml";

/// Configuration for a launcher run.
///
/// Every field has a default, so the launcher starts with no configuration
/// file and no arguments: it runs `python3 main.py` and watches `./main.py`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Name of the application module; the watched file is
    /// `<module>.<source_extension>`.
    pub module: String,

    /// Extension of the module's source file.
    pub source_extension: String,

    /// Interpreter used to run the module when no explicit command is set.
    pub interpreter: String,

    /// Explicit command line, overriding `interpreter <source file>`.
    pub command: Option<Vec<String>>,

    /// Directory containing the source file.
    pub watch_dir: PathBuf,

    /// Notification backend.
    pub backend: WatchBackend,

    /// Pause before restarting, so editors finish writing.
    pub restart_delay_ms: u64,
}

impl LaunchConfig {
    /// Create a configuration for the given module with default values.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load `relaunch.toml` from `dir` if present, else use defaults.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            debug!("Loading configuration from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Set an explicit command line.
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    /// Set the directory containing the source file.
    pub fn with_watch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watch_dir = dir.into();
        self
    }

    /// Set the notification backend.
    pub fn with_backend(mut self, backend: WatchBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the restart delay.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check that the configuration can describe a launch.
    pub fn validate(&self) -> Result<()> {
        if self.module.trim().is_empty() {
            return Err(LaunchError::Config("module name is empty".to_string()));
        }

        if let Some(command) = &self.command {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(LaunchError::Config("command is empty".to_string()));
            }
        } else if self.interpreter.trim().is_empty() {
            return Err(LaunchError::Config(
                "interpreter is empty and no command is set".to_string(),
            ));
        }

        Ok(())
    }

    /// File name of the module's source.
    pub fn source_file_name(&self) -> String {
        if self.source_extension.is_empty() {
            self.module.clone()
        } else {
            format!("{}.{}", self.module, self.source_extension)
        }
    }

    /// The directory and file to watch.
    pub fn watch_target(&self) -> WatchTarget {
        WatchTarget::new(&self.watch_dir, self.source_file_name()).with_backend(self.backend)
    }

    /// The command that runs one session.
    pub fn launch_command(&self) -> Result<LaunchCommand> {
        self.validate()?;

        let command = match &self.command {
            Some(command) => {
                let (program, args) = command
                    .split_first()
                    .ok_or_else(|| LaunchError::Config("command is empty".to_string()))?;
                LaunchCommand::new(program).with_args(args.iter().cloned())
            }
            None => LaunchCommand::new(&self.interpreter).with_args([self.source_file_name()]),
        };

        Ok(command.with_working_dir(&self.watch_dir))
    }

    /// Pause before restarting.
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            module: "main".to_string(),
            source_extension: "py".to_string(),
            interpreter: "python3".to_string(),
            command: None,
            watch_dir: PathBuf::from("."),
            backend: WatchBackend::Native,
            restart_delay_ms: 100,
        }
    }
}

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCommand {
    /// Program to run.
    pub program: String,

    /// Arguments.
    pub args: Vec<String>,

    /// Working directory (None = inherit).
    pub working_dir: Option<PathBuf>,
}

impl LaunchCommand {
    /// Create a new command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
