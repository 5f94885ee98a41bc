//! Log sinks for replication diagnostics
//!
//! The engine and session receive a sink at construction - there is no
//! global logger. Sinks are infallible by contract: a sink that cannot
//! write must swallow the failure, because nothing in the replication path
//! is allowed to die over a log line.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Destination for replication log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Timestamped lines to stderr.
#[derive(Debug, Default)]
pub struct StderrLog;

impl LogSink for StderrLog {
    fn log(&self, message: &str) {
        let _ = writeln!(std::io::stderr(), "{}\t{}", timestamp(), message);
    }
}

/// Upper bound on carried-over text when the log file is unwritable.
const MAX_PENDING_BYTES: usize = 64 * 1024;

const CARRYOVER_NOTICE: &str = "cannot access log file - this will be logged when possible\n";

/// Appending file sink.
///
/// Lines that cannot be written are held in a pending buffer (plus a
/// carry-over notice) and flushed ahead of the next successful write, so a
/// temporarily unwritable log file loses nothing. The buffer is capped;
/// past the cap the oldest text is dropped.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    pending: Mutex<String>,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Mutex::new(String::new()),
        }
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())
    }
}

impl LogSink for FileLog {
    fn log(&self, message: &str) {
        let mut pending = lock_unpoisoned(&self.pending);
        pending.push_str(&timestamp());
        pending.push('\t');
        pending.push_str(message);
        pending.push('\n');

        match self.append(&pending) {
            Ok(()) => pending.clear(),
            Err(_) => {
                pending.push_str(CARRYOVER_NOTICE);
                if pending.len() > MAX_PENDING_BYTES {
                    let mut cut = pending.len() - MAX_PENDING_BYTES;
                    while !pending.is_char_boundary(cut) {
                        cut += 1;
                    }
                    pending.drain(..cut);
                }
            }
        }
    }
}

/// Fan-out to several sinks (console echo alongside the log file).
pub struct TeeLog {
    sinks: Vec<Box<dyn LogSink>>,
}

impl TeeLog {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for TeeLog {
    fn log(&self, message: &str) {
        for sink in &self.sinks {
            sink.log(message);
        }
    }
}

/// In-memory capture for unit tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryLog {
    lines: std::sync::Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock_unpoisoned(&self.lines).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

#[cfg(test)]
impl LogSink for MemoryLog {
    fn log(&self, message: &str) {
        lock_unpoisoned(&self.lines).push(message.to_string());
    }
}
