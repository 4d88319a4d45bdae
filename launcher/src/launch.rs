//! Entry point: monitored restart loop, or a single run when watching is not
//! available.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::Application;
use crate::config::LaunchConfig;
use crate::controller::{LifecycleController, RunSummary};
use crate::error::{LaunchError, Result};

/// How a launch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The restart loop ran to completion.
    Monitored(RunSummary),

    /// Watching was unavailable; the application ran exactly once.
    Unmonitored,
}

/// Run `app` under the restart loop described by `config`.
///
/// If the watch facility is unavailable a warning is logged and the
/// application is started exactly once, with no restart behaviour.
///
/// # Errors
///
/// Application failures and watcher errors other than unavailability are
/// returned unchanged.
pub fn launch<A: Application + 'static>(
    config: &LaunchConfig,
    app: Arc<A>,
) -> Result<LaunchOutcome> {
    config.validate()?;

    let controller = match LifecycleController::new(config.watch_target(), app.clone()) {
        Ok(controller) => controller,
        Err(LaunchError::Watcher(e)) if e.is_unavailable() => {
            warn!("{e}. Launching application without restart-on-change...");
            app.start()?;
            info!("Application exited. Bye!");
            return Ok(LaunchOutcome::Unmonitored);
        }
        Err(e) => return Err(e),
    };

    let summary = controller
        .with_restart_delay(config.restart_delay())
        .run()?;
    info!(
        "Ran {} session(s), {} restart(s)",
        summary.sessions, summary.restarts
    );

    Ok(LaunchOutcome::Monitored(summary))
}
