//! The contract between the launcher and the application it supervises.

/// An application that can be started, stopped from another thread, and
/// reloaded between runs.
///
/// One call to [`Application::start`] is a *session*. The launcher never runs
/// two sessions at once and only calls [`Application::reload`] while no
/// session is running.
pub trait Application: Send + Sync {
    /// Run one session, blocking until it ends.
    ///
    /// Returns `Ok(())` when the session ended because [`Application::stop`]
    /// was called or because the application exited cleanly. Any other
    /// termination must be reported as an error.
    fn start(&self) -> anyhow::Result<()>;

    /// Ask the current session to end.
    ///
    /// Called from the watcher's dispatcher thread, possibly before `start`
    /// has finished bringing the session up; the request must still end that
    /// session. Must not block for long and must not call back into the
    /// launcher.
    fn stop(&self);

    /// Prepare the next session to run the latest code on disk.
    ///
    /// Called again, before the session starts, if the source changes while
    /// a reload is in progress.
    ///
    /// Also the place to discard a stop request that raced with the end of
    /// the previous session.
    fn reload(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
