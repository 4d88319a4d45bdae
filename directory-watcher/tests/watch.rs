//! Integration tests for watching a real directory.
//!
//! These drive the platform notifier against a scratch directory, so every
//! wait is bounded by a generous timeout.

use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use relaunch_directory_watcher::{
    ChangeEvent, FileChangeWatcher, FileEventKind, WatchBackend, WatchTarget,
};
use tempfile::TempDir;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Start a watcher on `dir` whose callback forwards events to a channel.
fn watch(dir: &Path, backend: WatchBackend) -> (FileChangeWatcher, Receiver<ChangeEvent>) {
    fs::write(dir.join("main.py"), "print('v1')\n").unwrap();

    let (tx, rx) = mpsc::channel();
    let target = WatchTarget::new(dir, "main.py").with_backend(backend);
    let watcher = FileChangeWatcher::start(target, move |event: &ChangeEvent| {
        let _ = tx.send(event.clone());
    })
    .unwrap();

    (watcher, rx)
}

#[test]
fn test_modification_of_target_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let (mut watcher, rx) = watch(temp_dir.path(), WatchBackend::Native);

    fs::write(temp_dir.path().join("main.py"), "print('v2')\n").unwrap();

    let event = rx.recv_timeout(EVENT_TIMEOUT).unwrap();
    assert!(event.kind.is_write());
    assert_eq!(event.path.file_name().unwrap(), "main.py");
    assert_eq!(event.sequence, 1);
    assert!(watcher.matched_events() >= 1);

    watcher.stop().unwrap();
}

#[test]
fn test_other_files_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let (mut watcher, rx) = watch(temp_dir.path(), WatchBackend::Native);

    for i in 0..5 {
        fs::write(temp_dir.path().join("other.py"), format!("x = {i}\n")).unwrap();
        fs::write(temp_dir.path().join("main.py.swp"), format!("{i}")).unwrap();
    }

    assert_eq!(
        rx.recv_timeout(QUIET_PERIOD).unwrap_err(),
        RecvTimeoutError::Timeout
    );
    assert_eq!(watcher.matched_events(), 0);

    watcher.stop().unwrap();
}

#[test]
fn test_replace_on_write_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let (mut watcher, rx) = watch(temp_dir.path(), WatchBackend::Native);

    // Editors that save atomically write a sibling then rename it over the
    // original; the directory watch must survive this repeatedly.
    for round in 0..2 {
        let swap = temp_dir.path().join(".main.py.tmp");
        fs::write(&swap, format!("print({round})\n")).unwrap();
        fs::rename(&swap, temp_dir.path().join("main.py")).unwrap();

        let event = rx.recv_timeout(EVENT_TIMEOUT).unwrap();
        assert_eq!(event.path.file_name().unwrap(), "main.py");
        assert!(matches!(
            event.kind,
            FileEventKind::RenamedTo | FileEventKind::Created | FileEventKind::Modified
        ));

        // Drain the remaining events of this save before the next round.
        while rx.recv_timeout(QUIET_PERIOD).is_ok() {}
    }

    watcher.stop().unwrap();
}

#[test]
fn test_no_callback_after_stop() {
    let temp_dir = TempDir::new().unwrap();
    let (mut watcher, rx) = watch(temp_dir.path(), WatchBackend::Native);

    watcher.stop().unwrap();
    fs::write(temp_dir.path().join("main.py"), "print('after stop')\n").unwrap();

    // The callback (and its sender) went away with the dispatcher thread.
    assert_eq!(
        rx.recv_timeout(QUIET_PERIOD).unwrap_err(),
        RecvTimeoutError::Disconnected
    );
    assert!(!watcher.is_running());
}

#[test]
fn test_poll_backend_reports_changes() {
    let temp_dir = TempDir::new().unwrap();
    let (mut watcher, rx) = watch(
        temp_dir.path(),
        WatchBackend::poll(Duration::from_millis(50)),
    );

    // The poller hashes contents, so coarse modification times do not hide
    // this write.
    fs::write(
        temp_dir.path().join("main.py"),
        "print('a considerably longer second version')\n",
    )
    .unwrap();

    let event = rx.recv_timeout(EVENT_TIMEOUT).unwrap();
    assert_eq!(event.path.file_name().unwrap(), "main.py");

    watcher.stop().unwrap();
}
