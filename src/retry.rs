//! Bounded retry for replication operations
//!
//! Transient IO failures (locked files, permission hiccups, sharing
//! violations) are retried with a fixed backoff. NotFound is different: it
//! is returned to the caller immediately, because what it means depends on
//! the operation - terminal for a copy, success for a delete, a fallback
//! signal for a rename. That decision stays with the replication engine.

use std::io;
use std::time::Duration;

use crate::logging::LogSink;

/// Default number of attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts, in milliseconds.
pub const BACKOFF_MS: u64 = 1000;

/// How a retried operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The operation succeeded (possibly after retries).
    Completed,
    /// The operation failed with `ErrorKind::NotFound`; never retried.
    NotFound,
    /// Every attempt failed transiently; one log line was written.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: Duration::from_millis(BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            // A policy that never runs the operation is useless.
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds, reports NotFound, or exhausts the
    /// attempt budget. Exhaustion is logged through `log` with `describe`
    /// naming the operation ("copying 'a' to 'b'"). Never panics, never
    /// returns an error.
    pub fn execute<F>(&self, log: &dyn LogSink, describe: &str, mut op: F) -> RetryOutcome
    where
        F: FnMut() -> io::Result<()>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(()) => return RetryOutcome::Completed,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return RetryOutcome::NotFound;
                }
                Err(err) => {
                    if attempt >= self.max_attempts {
                        log.log(&format!(
                            "error {}: {} (gave up after {} attempts)",
                            describe, err, attempt
                        ));
                        return RetryOutcome::Exhausted;
                    }
                    std::thread::sleep(self.backoff);
                }
            }
        }
    }
}
