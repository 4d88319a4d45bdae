//! The restart loop.
//!
//! The controller runs one session of the application at a time on the
//! caller's thread. The watcher's dispatcher thread flags a restart and asks
//! the application to stop; once the session returns the controller reloads
//! the application and starts the next session.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use relaunch_directory_watcher::{ChangeEvent, FileChangeWatcher, WatchTarget};
use tracing::{debug, info, trace, warn};

use crate::application::Application;
use crate::error::Result;

/// Default pause between a stopped session and the next one.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(100);

/// Where the controller is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting to reload. A change now is picked up by the reload.
    Preparing,

    /// The application is reloading. A change now forces another reload.
    Reloading,

    /// A session is running. A change now stops it.
    Running,

    /// A stop was requested and the session has not returned yet.
    Stopping,

    /// The session has returned. A change now starts another one.
    Exited,

    /// The loop has exited.
    Finished,
}

/// State shared between the loop and the watcher callback.
#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,

    /// Set by the callback, cleared at the top of every iteration. Starts
    /// set so the first session always runs.
    restart_requested: bool,

    /// Sessions scheduled because of a change.
    restarts: u64,
}

/// Counts from a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Sessions started.
    pub sessions: u64,

    /// Sessions started again because the source changed.
    pub restarts: u64,
}

/// Runs an application repeatedly, once per detected source change.
pub struct LifecycleController<A: Application + 'static> {
    app: Arc<A>,
    state: Arc<Mutex<SessionState>>,
    watcher: FileChangeWatcher,
    restart_delay: Duration,
}

impl<A: Application + 'static> LifecycleController<A> {
    /// Create a controller and start watching `target`.
    ///
    /// # Errors
    ///
    /// Fails with a watcher error if watching cannot start; use
    /// [`crate::LaunchError::is_watch_unavailable`] to tell whether an
    /// unmonitored run is the right fallback.
    pub fn new(target: WatchTarget, app: Arc<A>) -> Result<Self> {
        let state = Arc::new(Mutex::new(SessionState {
            phase: SessionPhase::Preparing,
            restart_requested: true,
            restarts: 0,
        }));

        let watcher = {
            let state = state.clone();
            let app = app.clone();
            FileChangeWatcher::start(target, move |event: &ChangeEvent| {
                on_source_changed(&state, app.as_ref(), event);
            })?
        };

        Ok(Self {
            app,
            state,
            watcher,
            restart_delay: DEFAULT_RESTART_DELAY,
        })
    }

    /// Set the pause between a stopped session and the next one.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Whether another session is pending.
    pub fn restart_requested(&self) -> bool {
        self.state.lock().restart_requested
    }

    /// Current phase of the loop.
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// The watched target.
    pub fn target(&self) -> &WatchTarget {
        self.watcher.target()
    }

    /// Run sessions until one ends with no restart pending.
    ///
    /// The watcher is stopped before this returns, on success and on error.
    ///
    /// # Errors
    ///
    /// An error from [`Application::start`] or [`Application::reload`] ends
    /// the loop and is returned as [`crate::LaunchError::Application`].
    pub fn run(mut self) -> Result<RunSummary> {
        let mut sessions: u64 = 0;

        let outcome = loop {
            {
                let mut state = self.state.lock();
                if !state.restart_requested {
                    state.phase = SessionPhase::Finished;
                    break Ok(());
                }
                state.restart_requested = false;
                state.phase = SessionPhase::Preparing;
            }

            if sessions > 0 && !self.restart_delay.is_zero() {
                thread::sleep(self.restart_delay);
            }

            if let Err(e) = self.reload_app() {
                break Err(e.context("failed to reload application"));
            }

            sessions += 1;
            debug!("Starting session {sessions}");

            let result = self.app.start();

            // Taking the lock here waits out a callback that is mid-stop.
            self.state.lock().phase = SessionPhase::Exited;

            if let Err(e) = result {
                break Err(e);
            }
        };

        let restarts = {
            let mut state = self.state.lock();
            state.phase = SessionPhase::Finished;
            state.restarts
        };

        if let Err(e) = self.watcher.stop() {
            warn!("Failed to stop watcher: {e}");
        }

        outcome?;
        info!("Application exited with no restart pending. Bye!");

        Ok(RunSummary { sessions, restarts })
    }

    /// Reload until no change lands mid-reload, then enter `Running`.
    fn reload_app(&self) -> anyhow::Result<()> {
        loop {
            self.state.lock().phase = SessionPhase::Reloading;
            self.app.reload()?;

            let mut state = self.state.lock();
            if state.restart_requested {
                state.restart_requested = false;
                debug!("Source changed while reloading, reloading again");
                continue;
            }
            state.phase = SessionPhase::Running;
            return Ok(());
        }
    }
}

fn on_source_changed<A: Application + ?Sized>(
    state: &Mutex<SessionState>,
    app: &A,
    event: &ChangeEvent,
) {
    let mut state = state.lock();
    let phase = state.phase;
    match phase {
        SessionPhase::Running => {
            state.restart_requested = true;
            state.phase = SessionPhase::Stopping;
            state.restarts += 1;
            info!(
                "File modification detected ({}). Restarting application...",
                event.path.display()
            );
            // Delivered under the lock so the loop cannot reload before the
            // stop request has been handed over.
            app.stop();
            debug!(
                "Stop delivered {:?} after change #{}",
                event.observed_at.elapsed(),
                event.sequence
            );
        }
        SessionPhase::Exited if !state.restart_requested => {
            state.restart_requested = true;
            state.restarts += 1;
            info!(
                "File modification detected ({}). Starting application again...",
                event.path.display()
            );
        }
        SessionPhase::Reloading => {
            state.restart_requested = true;
            debug!("Change #{} landed mid-reload", event.sequence);
        }
        SessionPhase::Stopping | SessionPhase::Exited => {
            debug!("Change #{} folded into the pending restart", event.sequence);
        }
        SessionPhase::Preparing => {
            debug!("Change #{} picked up by the next reload", event.sequence);
        }
        SessionPhase::Finished => {
            trace!("Change #{} after shutdown ignored", event.sequence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaunch_directory_watcher::FileEventKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingApp {
        stops: AtomicU32,
    }

    impl Application for CountingApp {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn state(phase: SessionPhase) -> Mutex<SessionState> {
        Mutex::new(SessionState {
            phase,
            restart_requested: false,
            restarts: 0,
        })
    }

    fn change(sequence: u64) -> ChangeEvent {
        ChangeEvent::new(FileEventKind::Modified, "main.py", sequence)
    }

    #[test]
    fn test_change_while_running_stops_once() {
        let app = CountingApp::default();
        let state = state(SessionPhase::Running);

        on_source_changed(&state, &app, &change(1));
        on_source_changed(&state, &app, &change(2));
        on_source_changed(&state, &app, &change(3));

        let state = state.lock();
        assert_eq!(app.stops.load(Ordering::SeqCst), 1);
        assert_eq!(state.phase, SessionPhase::Stopping);
        assert!(state.restart_requested);
        assert_eq!(state.restarts, 1);
    }

    #[test]
    fn test_change_before_reload_is_coalesced() {
        let app = CountingApp::default();
        let state = state(SessionPhase::Preparing);

        on_source_changed(&state, &app, &change(1));

        let state = state.lock();
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
        assert!(!state.restart_requested);
        assert_eq!(state.phase, SessionPhase::Preparing);
    }

    #[test]
    fn test_change_during_reload_requests_another_reload() {
        let app = CountingApp::default();
        let state = state(SessionPhase::Reloading);

        on_source_changed(&state, &app, &change(1));

        let state = state.lock();
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
        assert!(state.restart_requested);
        assert_eq!(state.restarts, 0);
        assert_eq!(state.phase, SessionPhase::Reloading);
    }

    #[test]
    fn test_change_after_session_exit_schedules_restart() {
        let app = CountingApp::default();
        let state = state(SessionPhase::Exited);

        on_source_changed(&state, &app, &change(1));
        on_source_changed(&state, &app, &change(2));

        let state = state.lock();
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
        assert!(state.restart_requested);
        assert_eq!(state.restarts, 1);
        assert_eq!(state.phase, SessionPhase::Exited);
    }

    #[test]
    fn test_change_after_finish_is_ignored() {
        let app = CountingApp::default();
        let state = state(SessionPhase::Finished);

        on_source_changed(&state, &app, &change(1));

        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
        assert!(!state.lock().restart_requested);
    }

    #[test]
    fn test_first_session_always_runs() {
        let temp_dir = TempDir::new().unwrap();
        let app = Arc::new(CountingApp::default());
        let target = WatchTarget::new(temp_dir.path(), "main.py");

        let controller = LifecycleController::new(target, app.clone()).unwrap();
        assert!(controller.restart_requested());
        assert_eq!(controller.phase(), SessionPhase::Preparing);

        let summary = controller.run().unwrap();
        assert_eq!(summary, RunSummary { sessions: 1, restarts: 0 });
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
    }
}
