//! Replication engine: one dispatched event in, one mirrored operation out
//!
//! `apply` is infallible. Every failure is either resolved by the retry
//! policy, converged by a fallback, or logged and dropped. A NotFound from
//! the filesystem means something different per operation, and the
//! distinction lives here where it is visible:
//!
//! - copy: the source vanished before we got to it; log once, stop.
//! - rename: the destination never had the old name (or lost its parent);
//!   fall back to copying the renamed item from the source.
//! - delete: the item is already gone, which is the desired end state;
//!   silent success.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::event::{ChangeEvent, EventKind};
use crate::filter::ExcludeFilter;
use crate::fsops::{self, ElementKind};
use crate::logging::LogSink;
use crate::mapper::PathMapper;
use crate::retry::{RetryOutcome, RetryPolicy};

pub struct ReplicationEngine {
    mapper: PathMapper,
    retry: RetryPolicy,
    exclude: Arc<ExcludeFilter>,
    log: Arc<dyn LogSink>,
}

impl ReplicationEngine {
    pub fn new(
        mapper: PathMapper,
        retry: RetryPolicy,
        exclude: Arc<ExcludeFilter>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            mapper,
            retry,
            exclude,
            log,
        }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Mirror one change into the destination tree.
    pub fn apply(&self, event: &ChangeEvent) {
        match event.kind {
            EventKind::Created => self.apply_copy(&event.path),
            EventKind::Changed => self.apply_changed(&event.path),
            EventKind::Renamed => match &event.previous {
                Some(previous) => self.apply_renamed(previous, &event.path),
                // Half a rename; copying the surviving path converges.
                None => self.apply_copy(&event.path),
            },
            EventKind::Deleted => self.apply_deleted(&event.path),
        }
    }

    /// Copy a file or a whole directory tree to its mapped destination.
    fn apply_copy(&self, source: &Path) {
        let destination = match self.map(source) {
            Some(destination) => destination,
            None => return,
        };
        let describe = format!(
            "copying '{}' to '{}'",
            source.display(),
            destination.display()
        );
        let outcome = self.retry.execute(&*self.log, &describe, || {
            self.copy_element(source, &destination)
        });
        if outcome == RetryOutcome::NotFound {
            self.log.log(&format!(
                "'{}' no longer exists, skipping copy",
                source.display()
            ));
        }
    }

    fn apply_changed(&self, source: &Path) {
        // Content changes on a directory arrive as events on its children;
        // acting on the directory itself would duplicate every copy.
        if let Ok(ElementKind::Directory) = fsops::element_kind(source) {
            return;
        }
        self.apply_copy(source);
    }

    fn apply_renamed(&self, previous: &Path, path: &Path) {
        let from = match self.map(previous) {
            Some(from) => from,
            // Moved in from outside the mirrored tree; a plain copy converges.
            None => return self.apply_copy(path),
        };
        let to = match self.map(path) {
            Some(to) => to,
            None => return,
        };
        let describe = format!("moving '{}' to '{}'", from.display(), to.display());
        let outcome = self
            .retry
            .execute(&*self.log, &describe, || fsops::move_any(&from, &to));
        if outcome == RetryOutcome::NotFound {
            // The destination has no old item to move (or its new parent is
            // missing). Copying from the source recreates whatever is needed.
            self.apply_copy(path);
        }
    }

    fn apply_deleted(&self, path: &Path) {
        let destination = match self.map(path) {
            Some(destination) => destination,
            None => return,
        };
        let describe = format!("removing '{}'", destination.display());
        // NotFound here is success: already gone.
        let _ = self
            .retry
            .execute(&*self.log, &describe, || fsops::remove_any(&destination));
    }

    fn map(&self, path: &Path) -> Option<PathBuf> {
        match self.mapper.to_destination(path) {
            Ok(destination) => Some(destination),
            Err(err) => {
                self.log.log(&format!("skipping event: {err}"));
                None
            }
        }
    }

    fn copy_element(&self, source: &Path, destination: &Path) -> io::Result<()> {
        match fsops::element_kind(source)? {
            ElementKind::File => fsops::copy_file(source, destination),
            ElementKind::Directory => self.copy_tree(source, destination),
        }
    }

    fn copy_tree(&self, source: &Path, destination: &Path) -> io::Result<()> {
        fsops::create_dir(destination)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            let path = entry.path();
            let is_dir = entry.file_type()?.is_dir();
            if let Ok(relative) = self.mapper.relativize(&path) {
                if self.exclude.is_excluded(&relative, is_dir) {
                    continue;
                }
            }
            let target = destination.join(entry.file_name());
            if is_dir {
                self.copy_tree(&path, &target)?;
            } else {
                fsops::copy_file(&path, &target)?;
            }
        }
        Ok(())
    }
}
