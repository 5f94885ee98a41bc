//! Live-session scenarios: a real watcher on real directories.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use hobbes::{
    DebounceWindows, EventMask, ExcludeFilter, MirrorSettings, RetryPolicy, WatchSession,
};

use crate::common::{wait_for, CaptureLog, MirrorFixture};

fn fast_settings(fixture: &MirrorFixture) -> MirrorSettings {
    MirrorSettings {
        source: fixture.source.clone(),
        destination: fixture.destination.clone(),
        events: EventMask::ALL,
        windows: DebounceWindows::new(Duration::from_millis(50)),
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
        workers: 2,
        exclude: Arc::new(ExcludeFilter::empty()),
        log_file: None,
    }
}

/// Creating a nested file in the source lands at the mirrored path with
/// matching content once the debounce window passes.
#[test]
fn nested_create_is_mirrored() {
    let fixture = MirrorFixture::new();
    let log = CaptureLog::new();
    let mut session = WatchSession::new(fast_settings(&fixture), Arc::new(log)).unwrap();
    session.start().unwrap();

    fixture.write_source("a/b.txt", "x");

    assert!(wait_for(5000, || fixture.dest("a/b.txt").exists()));
    drop(session);
    assert_eq!(fixture.read_dest("a/b.txt"), "x");
}

#[test]
fn delete_is_mirrored_and_reaches_destination_fast() {
    let fixture = MirrorFixture::new();
    fixture.write_source("doomed.txt", "x");
    fs::write(fixture.dest("doomed.txt"), "x").unwrap();

    let log = CaptureLog::new();
    let mut session = WatchSession::new(fast_settings(&fixture), Arc::new(log)).unwrap();
    session.start().unwrap();

    fs::remove_file(fixture.source.join("doomed.txt")).unwrap();

    assert!(wait_for(5000, || !fixture.dest("doomed.txt").exists()));
    drop(session);
}

#[test]
fn modified_file_is_overwritten_at_destination() {
    let fixture = MirrorFixture::new();
    let source = fixture.write_source("note.txt", "v1");
    fs::write(fixture.dest("note.txt"), "v1").unwrap();

    let log = CaptureLog::new();
    let mut session = WatchSession::new(fast_settings(&fixture), Arc::new(log)).unwrap();
    session.start().unwrap();

    fs::write(&source, "v2").unwrap();

    assert!(wait_for(5000, || {
        fs::read_to_string(fixture.dest("note.txt"))
            .map(|content| content == "v2")
            .unwrap_or(false)
    }));
    drop(session);
}

/// Renaming a source file converges even when the destination never saw
/// the old name: the new name appears with source content.
#[test]
fn rename_with_absent_destination_old_path_converges() {
    let fixture = MirrorFixture::new();
    let old = fixture.write_source("old.txt", "payload");
    // The destination deliberately has no old.txt.

    let log = CaptureLog::new();
    let mut session = WatchSession::new(fast_settings(&fixture), Arc::new(log)).unwrap();
    session.start().unwrap();

    fs::rename(&old, fixture.source.join("new.txt")).unwrap();

    assert!(wait_for(5000, || fixture.dest("new.txt").exists()));
    drop(session);
    assert_eq!(fixture.read_dest("new.txt"), "payload");
}

/// A replication that is still pending at stop() is applied before the
/// session is dropped.
#[test]
fn pending_replication_survives_stop() {
    let fixture = MirrorFixture::new();
    let mut settings = fast_settings(&fixture);
    settings.windows = DebounceWindows::new(Duration::from_millis(400));

    let log = CaptureLog::new();
    let mut session = WatchSession::new(settings, Arc::new(log)).unwrap();
    session.start().unwrap();

    fixture.write_source("pending.txt", "late");
    // Let the notification reach the debounce table, then stop inside the
    // window.
    std::thread::sleep(Duration::from_millis(150));
    session.stop();
    drop(session);

    assert_eq!(fixture.read_dest("pending.txt"), "late");
}
