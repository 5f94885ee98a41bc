//! Exclude patterns for mirrored paths
//!
//! Patterns use gitignore syntax and are matched against paths relative to
//! the source root. An excluded event is dropped before it reaches the
//! debounce table, so excluded churn never costs a replication.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{HobbesError, HobbesResult};

/// Compiled exclude patterns, shared read-only across threads.
#[derive(Debug)]
pub struct ExcludeFilter {
    matcher: Gitignore,
    patterns: Vec<String>,
}

impl ExcludeFilter {
    /// Compile a pattern list. An unparseable pattern is a configuration
    /// error, reported before any watching starts.
    pub fn from_patterns<I, S>(patterns: I) -> HobbesResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|e| HobbesError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            kept.push(pattern.to_string());
        }
        let matcher = builder.build().map_err(|e| HobbesError::InvalidPattern {
            pattern: String::new(),
            message: e.to_string(),
        })?;
        Ok(Self {
            matcher,
            patterns: kept,
        })
    }

    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            patterns: Vec::new(),
        }
    }

    /// Check a path relative to the source root. A path is excluded when
    /// it or any of its parents matches a pattern.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for ExcludeFilter {
    fn default() -> Self {
        Self::empty()
    }
}
