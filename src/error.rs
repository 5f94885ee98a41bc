//! Error types for Hobbes
//!
//! Uses `thiserror` for library errors. Failures inside the replication
//! path itself stay `std::io::Error` and are classified by `ErrorKind`
//! (see `retry`); they are resolved or logged there and never surface as
//! a `HobbesError`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Hobbes operations
pub type HobbesResult<T> = Result<T, HobbesError>;

/// Main error type for Hobbes operations
#[derive(Error, Debug)]
pub enum HobbesError {
    /// A configured root path is not absolute
    #[error("{role} path '{path}' is not absolute")]
    RootNotAbsolute { role: &'static str, path: PathBuf },

    /// Destination lies inside the source (or the roots are equal)
    #[error("destination '{destination}' is inside source '{source_root}' - the mirror would feed itself")]
    NestedRoots {
        source_root: PathBuf,
        destination: PathBuf,
    },

    /// Source root does not exist or is not a directory
    #[error("source directory not found: {path}")]
    SourceMissing { path: PathBuf },

    /// Path is not located under the expected root
    #[error("path '{path}' is outside root '{root}'")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Invalid configuration file
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Required setting is absent from config, environment, and flags
    #[error("missing required setting '{key}' - set it in hobbes.toml or pass --{flag}")]
    MissingSetting { key: &'static str, flag: &'static str },

    /// An exclude pattern failed to compile
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Watcher subscription failure at session start
    #[error("watch error: {0}")]
    Watch(String),
}
