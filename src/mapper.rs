//! Source-to-destination path mapping
//!
//! Maps an absolute path under the source root to its mirror location
//! under the destination root by splicing path components. No filesystem
//! access and no escaping layer: components carry spaces, `%`, `#`, `&`,
//! and non-ASCII bytes through unchanged.

use std::path::{Path, PathBuf};

use crate::error::{HobbesError, HobbesResult};

/// Maps paths between the source and destination roots.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl PathMapper {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Strip the source root prefix. The source root itself relativizes to
    /// the empty path.
    pub fn relativize(&self, path: &Path) -> HobbesResult<PathBuf> {
        path.strip_prefix(&self.source_root)
            .map(Path::to_path_buf)
            .map_err(|_| HobbesError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.source_root.clone(),
            })
    }

    /// Map a source path to its destination mirror.
    pub fn to_destination(&self, path: &Path) -> HobbesResult<PathBuf> {
        let relative = self.relativize(path)?;
        Ok(self.destination_root.join(relative))
    }

    /// Inverse mapping: a destination path back to its source original.
    pub fn to_source(&self, path: &Path) -> HobbesResult<PathBuf> {
        let relative = path
            .strip_prefix(&self.destination_root)
            .map_err(|_| HobbesError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.destination_root.clone(),
            })?;
        Ok(self.source_root.join(relative))
    }
}
