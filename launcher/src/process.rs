//! Process-per-session application.
//!
//! Each session spawns a fresh child process, so every restart runs whatever
//! is on disk at that moment. Nothing from a previous session survives into
//! the next one.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::application::Application;
use crate::config::LaunchCommand;
use crate::error::Result;

/// Runs a command as one child process per session.
pub struct ProcessApplication {
    /// Command spawned for every session.
    command: LaunchCommand,

    /// Runtime used to supervise the child.
    runtime: Runtime,

    /// Stop signal for the current session. Replaced on reload so a stale
    /// permit cannot end the next session.
    stop_signal: Mutex<Arc<Notify>>,
}

impl ProcessApplication {
    /// Create a new process application.
    pub fn new(command: LaunchCommand) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            command,
            runtime,
            stop_signal: Mutex::new(Arc::new(Notify::new())),
        })
    }

    /// The command spawned for every session.
    pub fn command(&self) -> &LaunchCommand {
        &self.command
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command.program);
        command.args(&self.command.args).kill_on_drop(true);
        if let Some(dir) = &self.command.working_dir {
            command.current_dir(dir);
        }
        command
    }

    async fn run_session(&self, stop_signal: &Notify) -> anyhow::Result<()> {
        let stopped = stop_signal.notified();
        tokio::pin!(stopped);

        // A stop that arrived before the session got going ends it without
        // spawning anything.
        tokio::select! {
            biased;
            () = &mut stopped => {
                debug!("Stop requested before spawn");
                return Ok(());
            }
            () = std::future::ready(()) => {}
        }

        let mut child = self
            .build_command()
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.command))?;
        info!(
            "Started `{}` (pid {})",
            self.command,
            child.id().map_or_else(|| "?".to_string(), |id| id.to_string())
        );

        tokio::select! {
            status = child.wait() => {
                let status = status
                    .with_context(|| format!("failed to wait for `{}`", self.command))?;
                if status.success() {
                    info!("`{}` exited", self.command);
                    Ok(())
                } else {
                    Err(anyhow!("`{}` exited with {status}", self.command))
                }
            }
            () = &mut stopped => {
                debug!("Killing `{}`", self.command);
                child
                    .kill()
                    .await
                    .with_context(|| format!("failed to kill `{}`", self.command))?;
                Ok(())
            }
        }
    }
}

impl Application for ProcessApplication {
    fn start(&self) -> anyhow::Result<()> {
        let stop_signal = self.stop_signal.lock().clone();
        self.runtime.block_on(self.run_session(&stop_signal))
    }

    fn stop(&self) {
        self.stop_signal.lock().notify_one();
    }

    fn reload(&self) -> anyhow::Result<()> {
        *self.stop_signal.lock() = Arc::new(Notify::new());
        Ok(())
    }
}

impl std::fmt::Debug for ProcessApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessApplication")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
