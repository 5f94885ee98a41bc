//! Races the replication path has to absorb, and the retry bound.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hobbes::{
    ChangeEvent, ExcludeFilter, PathMapper, ReplicationEngine, RetryOutcome, RetryPolicy,
};

use crate::common::{CaptureLog, MirrorFixture};

fn engine(fixture: &MirrorFixture, log: &CaptureLog) -> ReplicationEngine {
    ReplicationEngine::new(
        PathMapper::new(&fixture.source, &fixture.destination),
        RetryPolicy::new(5, Duration::from_millis(10)),
        Arc::new(ExcludeFilter::empty()),
        Arc::new(log.clone()),
    )
}

/// Deleting something the destination never had reports clean success.
#[test]
fn delete_of_absent_destination_is_silent() {
    let fixture = MirrorFixture::new();
    let log = CaptureLog::new();

    engine(&fixture, &log).apply(&ChangeEvent::deleted(fixture.source.join("g.txt")));

    assert!(log.messages().is_empty());
}

/// Repeated delivery of the same logical delete stays idempotent.
#[test]
fn replayed_delete_is_idempotent() {
    let fixture = MirrorFixture::new();
    fs::write(fixture.dest("twice.txt"), "x").unwrap();
    let log = CaptureLog::new();
    let engine = engine(&fixture, &log);

    let event = ChangeEvent::deleted(fixture.source.join("twice.txt"));
    engine.apply(&event);
    engine.apply(&event);

    assert!(!fixture.dest("twice.txt").exists());
    assert!(log.messages().is_empty());
}

/// The source vanishing between notification and copy is terminal: one
/// log line, no retries, no destination mutation.
#[test]
fn vanished_source_is_logged_once() {
    let fixture = MirrorFixture::new();
    let log = CaptureLog::new();

    engine(&fixture, &log).apply(&ChangeEvent::created(fixture.source.join("ghost.txt")));

    assert_eq!(log.messages().len(), 1);
    assert!(log.contains("no longer exists"));
    assert!(!fixture.dest("ghost.txt").exists());
}

/// Rename whose destination old path is missing falls back to copying the
/// new path from the source.
#[test]
fn rename_fallback_recreates_from_source() {
    let fixture = MirrorFixture::new();
    let renamed = fixture.write_source("new.txt", "content");
    let log = CaptureLog::new();

    engine(&fixture, &log).apply(&ChangeEvent::renamed(
        fixture.source.join("old.txt"),
        renamed,
    ));

    assert_eq!(fixture.read_dest("new.txt"), "content");
    assert!(!fixture.dest("old.txt").exists());
}

/// An operation that fails on every attempt runs exactly max_attempts
/// times with the backoff between attempts, then logs and returns.
#[test]
fn persistent_failure_exhausts_the_retry_budget() {
    let log = CaptureLog::new();
    let policy = RetryPolicy::new(5, Duration::from_millis(20));

    let mut attempts = 0;
    let started = Instant::now();
    let outcome = policy.execute(&log, "copying '/src/locked.txt' to '/dst/locked.txt'", || {
        attempts += 1;
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        ))
    });

    assert_eq!(outcome, RetryOutcome::Exhausted);
    assert_eq!(attempts, 5);
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(log.messages().len(), 1);
    assert!(log.contains("locked.txt"));
    assert!(log.contains("gave up after 5 attempts"));
}

/// Exhaustion through the engine leaves the destination unchanged and the
/// caller alive.
#[test]
fn obstructed_copy_leaves_destination_unchanged() {
    let fixture = MirrorFixture::new();
    let source = fixture.write_source("blocked/file.txt", "x");
    // A plain file sits where the copy needs a directory.
    fs::write(fixture.dest("blocked"), "in the way").unwrap();
    let log = CaptureLog::new();

    engine(&fixture, &log).apply(&ChangeEvent::created(source));

    assert!(log.contains("gave up after 5 attempts"));
    assert_eq!(fixture.read_dest("blocked"), "in the way");
}
