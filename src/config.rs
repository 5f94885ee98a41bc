//! Configuration module for Hobbes
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (HOBBES_*)
//! 3. Explicit --config file, else ./hobbes.toml
//! 4. User config (~/.config/hobbes/config.toml)
//! 5. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::debounce::{DebounceWindows, DEBOUNCE_WINDOW_MS};
use crate::error::{HobbesError, HobbesResult};
use crate::event::{EventKind, EventMask};
use crate::filter::ExcludeFilter;
use crate::retry::{RetryPolicy, BACKOFF_MS, MAX_ATTEMPTS};

/// Mirror roots and event selection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorConfig {
    #[serde(default)]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Event kinds to mirror; empty means all
    #[serde(default)]
    pub events: Vec<EventKind>,

    /// Gitignore-style patterns skipped while watching and seeding
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Debounce configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

fn default_window_ms() -> u64 {
    DEBOUNCE_WINDOW_MS
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_attempts() -> u32 {
    MAX_ATTEMPTS
}

fn default_backoff_ms() -> u64 {
    BACKOFF_MS
}

/// Replication worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

/// Log sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Log file path; omit to log to stderr only
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mirror: MirrorConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub replicate: ReplicateConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> HobbesResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> HobbesResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| HobbesError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .split('.')
                    .last()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                ConfigWarning {
                    key: key.clone(),
                    file: path.to_path_buf(),
                    line: find_line_number(&content, &key),
                    suggestion: suggest_key(&key),
                }
            })
            .collect();

        Ok((config, warnings))
    }

    /// Resolve a config file: the explicit path if given, else
    /// `./hobbes.toml`, else the user config, else defaults. Returns the
    /// file actually used alongside any warnings. A missing explicit file
    /// is an error; missing discovery-tier files just fall through.
    pub fn discover(
        explicit: Option<&Path>,
    ) -> HobbesResult<(Self, Vec<ConfigWarning>, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let (config, warnings) = Self::load_with_warnings(path)?;
            return Ok((config, warnings, Some(path.to_path_buf())));
        }

        let local = PathBuf::from("hobbes.toml");
        if local.exists() {
            let (config, warnings) = Self::load_with_warnings(&local)?;
            return Ok((config, warnings, Some(local)));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("hobbes/config.toml");
            if user.exists() {
                let (config, warnings) = Self::load_with_warnings(&user)?;
                return Ok((config, warnings, Some(user)));
            }
        }

        Ok((Self::default(), Vec::new(), None))
    }

    /// Apply environment variable overrides (HOBBES_* prefix)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(source) = std::env::var("HOBBES_SOURCE") {
            if !source.is_empty() {
                self.mirror.source = Some(PathBuf::from(source));
            }
        }

        if let Ok(destination) = std::env::var("HOBBES_DESTINATION") {
            if !destination.is_empty() {
                self.mirror.destination = Some(PathBuf::from(destination));
            }
        }

        // Comma-separated kind names; unknown names are skipped
        if let Ok(events) = std::env::var("HOBBES_EVENTS") {
            let parsed: Vec<EventKind> = events
                .split(',')
                .filter_map(EventKind::from_name)
                .collect();
            if !parsed.is_empty() {
                self.mirror.events = parsed;
            }
        }

        if let Ok(file) = std::env::var("HOBBES_LOG_FILE") {
            if !file.is_empty() {
                self.log.file = Some(PathBuf::from(file));
            }
        }

        self
    }

    /// Enabled event kinds (all if the list is empty)
    pub fn enabled_kinds(&self) -> EventMask {
        if self.mirror.events.is_empty() {
            EventMask::ALL
        } else {
            EventMask::from_kinds(&self.mirror.events)
        }
    }

    /// Convert to validated, ready-to-run settings.
    pub fn settings(&self) -> HobbesResult<MirrorSettings> {
        let source = self
            .mirror
            .source
            .clone()
            .ok_or(HobbesError::MissingSetting {
                key: "mirror.source",
                flag: "source",
            })?;
        let destination = self
            .mirror
            .destination
            .clone()
            .ok_or(HobbesError::MissingSetting {
                key: "mirror.destination",
                flag: "dest",
            })?;
        let exclude = ExcludeFilter::from_patterns(&self.mirror.exclude)?;

        let settings = MirrorSettings {
            source,
            destination,
            events: self.enabled_kinds(),
            windows: DebounceWindows::new(Duration::from_millis(self.debounce.window_ms)),
            retry: RetryPolicy::new(
                self.retry.attempts,
                Duration::from_millis(self.retry.backoff_ms),
            ),
            workers: self.replicate.workers.max(1),
            exclude: Arc::new(exclude),
            log_file: self.log.file.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Validated settings a session runs with.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub events: EventMask,
    pub windows: DebounceWindows,
    pub retry: RetryPolicy,
    pub workers: usize,
    pub exclude: Arc<ExcludeFilter>,
    pub log_file: Option<PathBuf>,
}

impl MirrorSettings {
    /// Roots must be absolute, and the destination must not live inside
    /// the source (the mirror would feed itself).
    pub fn validate(&self) -> HobbesResult<()> {
        if !self.source.is_absolute() {
            return Err(HobbesError::RootNotAbsolute {
                role: "source",
                path: self.source.clone(),
            });
        }
        if !self.destination.is_absolute() {
            return Err(HobbesError::RootNotAbsolute {
                role: "destination",
                path: self.destination.clone(),
            });
        }
        if self.destination.starts_with(&self.source) {
            return Err(HobbesError::NestedRoots {
                source_root: self.source.clone(),
                destination: self.destination.clone(),
            });
        }
        Ok(())
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "mirror",
        "source",
        "destination",
        "events",
        "exclude",
        "debounce",
        "window_ms",
        "retry",
        "attempts",
        "backoff_ms",
        "replicate",
        "workers",
        "log",
        "file",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = std::cmp::min(
                std::cmp::min(prev[j + 1] + 1, curr[j] + 1),
                prev[j] + cost,
            );
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
