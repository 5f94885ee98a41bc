//! Thin filesystem primitives used by the replication engine
//!
//! Each helper does one thing and reports plain `io::Error`, leaving retry
//! classification to the caller.

use std::fs;
use std::io;
use std::path::Path;

/// What kind of element a source path points at right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    File,
    Directory,
}

/// Probe `path` and classify it. Follows symlinks, like the copy that
/// comes after it would.
pub fn element_kind(path: &Path) -> io::Result<ElementKind> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        Ok(ElementKind::Directory)
    } else {
        Ok(ElementKind::File)
    }
}

/// Copy one file, creating the destination's parent directories first.
pub fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, destination)?;
    Ok(())
}

/// Create a directory and any missing ancestors.
pub fn create_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Rename a file or directory within the destination tree. Parents are
/// not created here: a missing parent surfaces as NotFound, and the
/// caller's copy fallback recreates the tree.
pub fn move_any(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// Remove a file or a whole directory tree, whichever `path` is.
/// Symlinks are removed as links, never followed.
pub fn remove_any(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
