//! Hobbes - filesystem change replication tool
//!
//! Hobbes watches a source directory tree and mirrors creations, changes,
//! renames, and deletions into a destination tree in near real time.
//! Notification bursts are coalesced before replication, transient IO
//! failures are retried, and no failure in the replication path ever
//! terminates a watch session.

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod fsops;
pub mod logging;
pub mod mapper;
pub mod retry;
pub mod session;

// Re-exports for convenience
pub use config::{Config, ConfigWarning, MirrorSettings};
pub use debounce::{DebounceWindows, EventDebouncer, DEBOUNCE_WINDOW_MS};
pub use engine::ReplicationEngine;
pub use error::{HobbesError, HobbesResult};
pub use event::{ChangeEvent, DebounceKey, EventKind, EventMask};
pub use filter::ExcludeFilter;
pub use logging::{FileLog, LogSink, StderrLog, TeeLog};
pub use mapper::PathMapper;
pub use retry::{RetryOutcome, RetryPolicy};
pub use session::WatchSession;
