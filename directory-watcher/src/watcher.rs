//! Directory watcher implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, trace, warn};

use crate::config::{WatchBackend, WatchTarget};
use crate::error::{Result, WatcherError};
use crate::event::{ChangeEvent, FileEventKind};

/// Name of the thread that delivers `on_change` callbacks.
pub const DISPATCHER_THREAD_NAME: &str = "relaunch-watcher";

/// Messages from the notify backend (and from `stop`) to the dispatcher.
enum Dispatch {
    Event(notify::Result<notify::Event>),
    Shutdown,
}

/// Watches one directory and invokes a callback for writes to one file.
///
/// Callbacks run on a dedicated dispatcher thread, one call per matching
/// event. Once [`FileChangeWatcher::stop`] returns the callback is never
/// invoked again.
pub struct FileChangeWatcher {
    /// What is being watched.
    target: WatchTarget,

    /// Internal notify watcher. `None` once stopped.
    backend: Option<Box<dyn Watcher>>,

    /// Sender used to wake the dispatcher for shutdown.
    dispatch_tx: Sender<Dispatch>,

    /// Dispatcher thread handle. `None` once stopped.
    dispatcher: Option<JoinHandle<()>>,

    /// Matching events delivered so far.
    matched: Arc<AtomicU64>,
}

impl FileChangeWatcher {
    /// Start watching `target` and return immediately.
    ///
    /// `on_change` is called on the dispatcher thread for every create,
    /// modify or rename-into-place event whose file name equals
    /// `target.file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::WatchUnavailable`] when the notification
    /// facility cannot be initialised (including [`WatchBackend::Disabled`]),
    /// and [`WatcherError::DirectoryNotFound`] when the directory is missing.
    pub fn start<F>(target: WatchTarget, on_change: F) -> Result<Self>
    where
        F: FnMut(&ChangeEvent) + Send + 'static,
    {
        target.validate()?;

        let (dispatch_tx, dispatch_rx) = mpsc::channel();

        let mut backend = create_backend(&target, dispatch_tx.clone())?;

        backend
            .watch(&target.directory, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::from_setup(e, &target.directory))?;

        let matched = Arc::new(AtomicU64::new(0));
        let dispatcher = {
            let target = target.clone();
            let matched = matched.clone();
            thread::Builder::new()
                .name(DISPATCHER_THREAD_NAME.to_string())
                .spawn(move || dispatch_loop(&target, &dispatch_rx, &matched, on_change))?
        };

        info!(
            "Watching {} for changes to {}",
            target.directory.display(),
            target.file_name.to_string_lossy()
        );

        Ok(Self {
            target,
            backend: Some(backend),
            dispatch_tx,
            dispatcher: Some(dispatcher),
            matched,
        })
    }

    /// Stop watching and wait for the dispatcher thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::AlreadyStopped`] if the watcher was already
    /// stopped. The watcher is left unchanged in that case.
    pub fn stop(&mut self) -> Result<()> {
        let Some(dispatcher) = self.dispatcher.take() else {
            return Err(WatcherError::AlreadyStopped);
        };

        // Drop the backend first so no new events are queued behind the
        // shutdown message.
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.unwatch(&self.target.directory) {
                debug!("Failed to unwatch {}: {e}", self.target.directory.display());
            }
        }

        if self.dispatch_tx.send(Dispatch::Shutdown).is_err() {
            debug!("Dispatcher already gone before shutdown");
        }

        if dispatcher.join().is_err() {
            error!("Watcher dispatcher thread panicked");
        }

        info!("Directory watcher stopped");
        Ok(())
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// The watched target.
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Number of matching events delivered to the callback so far.
    pub fn matched_events(&self) -> u64 {
        self.matched.load(Ordering::SeqCst)
    }
}

impl Drop for FileChangeWatcher {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

impl std::fmt::Debug for FileChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChangeWatcher")
            .field("target", &self.target)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn create_backend(
    target: &WatchTarget,
    dispatch_tx: Sender<Dispatch>,
) -> Result<Box<dyn Watcher>> {
    let handler = move |res: notify::Result<notify::Event>| {
        // The receiver is gone only after shutdown, when late events are moot.
        if dispatch_tx.send(Dispatch::Event(res)).is_err() {
            trace!("Dropping event after shutdown");
        }
    };

    let backend: notify::Result<Box<dyn Watcher>> = match target.backend {
        WatchBackend::Native => {
            notify::recommended_watcher(handler).map(|w| Box::new(w) as Box<dyn Watcher>)
        }
        WatchBackend::Poll { interval_ms: 0 } => {
            return Err(WatcherError::Config(
                "poll interval must be non-zero".to_string(),
            ));
        }
        WatchBackend::Poll { interval_ms } => {
            // Hash contents so saves within one mtime tick are still seen.
            let config = notify::Config::default()
                .with_poll_interval(Duration::from_millis(interval_ms))
                .with_compare_contents(true);
            PollWatcher::new(handler, config).map(|w| Box::new(w) as Box<dyn Watcher>)
        }
        WatchBackend::Disabled => {
            return Err(WatcherError::WatchUnavailable(
                "watching disabled by configuration".to_string(),
            ));
        }
    };

    backend.map_err(|e| WatcherError::from_setup(e, &target.directory))
}

fn dispatch_loop<F>(
    target: &WatchTarget,
    dispatch_rx: &Receiver<Dispatch>,
    matched: &AtomicU64,
    mut on_change: F,
) where
    F: FnMut(&ChangeEvent),
{
    while let Ok(message) = dispatch_rx.recv() {
        let event = match message {
            Dispatch::Shutdown => break,
            Dispatch::Event(Err(e)) => {
                warn!("Watch error: {e}");
                continue;
            }
            Dispatch::Event(Ok(event)) => event,
        };

        let kind = FileEventKind::from(event.kind);
        if !kind.is_write() {
            continue;
        }

        // A both-ends rename lists the source first; only the destination
        // received new content.
        let paths = match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                event.paths.last().map(std::slice::from_ref).unwrap_or_default()
            }
            _ => event.paths.as_slice(),
        };

        for path in paths.iter().filter(|p| target.matches(p)) {
            let sequence = matched.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Change #{sequence} ({kind:?}): {}", path.display());
            on_change(&ChangeEvent::new(kind, path.clone(), sequence));
        }
    }

    debug!("Watcher dispatcher exiting");
}
