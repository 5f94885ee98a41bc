//! Common test utilities for Hobbes scenario and CLI tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// Isolated source/destination pair on disk.
pub struct MirrorFixture {
    keep: TempDir,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl MirrorFixture {
    pub fn new() -> Self {
        let keep = TempDir::new().expect("create tempdir");
        let source = keep.path().join("source");
        let destination = keep.path().join("destination");
        fs::create_dir_all(&source).expect("create source root");
        fs::create_dir_all(&destination).expect("create destination root");
        Self {
            keep,
            source,
            destination,
        }
    }

    pub fn root(&self) -> &Path {
        self.keep.path()
    }

    /// Write a file under the source root, creating parent directories.
    pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create source parents");
        }
        fs::write(&path, content).expect("write source file");
        path
    }

    pub fn dest(&self, relative: &str) -> PathBuf {
        self.destination.join(relative)
    }

    pub fn read_dest(&self, relative: &str) -> String {
        fs::read_to_string(self.dest(relative)).expect("read destination file")
    }

    /// Write a hobbes.toml in the fixture root pointing at the fixture's
    /// roots, with `extra` appended after the [mirror] section.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.keep.path().join("hobbes.toml");
        let content = format!(
            "[mirror]\nsource = \"{}\"\ndestination = \"{}\"\n{}",
            self.source.display(),
            self.destination.display(),
            extra
        );
        fs::write(&path, content).expect("write config");
        path
    }
}

/// Log capture shared with a running session.
#[derive(Clone, Default)]
pub struct CaptureLog {
    lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().expect("capture log lock").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl hobbes::LogSink for CaptureLog {
    fn log(&self, message: &str) {
        self.lines.lock().expect("capture log lock").push(message.to_string());
    }
}

/// Poll `predicate` until it holds or `deadline_ms` elapses.
pub fn wait_for<P>(deadline_ms: u64, mut predicate: P) -> bool
where
    P: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(deadline_ms);
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}
