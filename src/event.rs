//! Change events and the enabled-kind mask
//!
//! A `ChangeEvent` is one observed mutation of the source tree. Events are
//! coalesced by `(path, kind)` identity, so renames key on their *new*
//! path; the previous path rides along as payload.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The four replicated change kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Changed,
    Renamed,
    Deleted,
}

impl EventKind {
    /// All kinds, in mask-bit order.
    pub const ALL_KINDS: [EventKind; 4] = [
        EventKind::Created,
        EventKind::Changed,
        EventKind::Renamed,
        EventKind::Deleted,
    ];

    fn bit(self) -> u8 {
        match self {
            EventKind::Created => 0b0001,
            EventKind::Changed => 0b0010,
            EventKind::Renamed => 0b0100,
            EventKind::Deleted => 0b1000,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "created" => Some(EventKind::Created),
            "changed" => Some(EventKind::Changed),
            "renamed" => Some(EventKind::Renamed),
            "deleted" => Some(EventKind::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "created",
            EventKind::Changed => "changed",
            EventKind::Renamed => "renamed",
            EventKind::Deleted => "deleted",
        };
        write!(f, "{}", name)
    }
}

/// Identity of a pending debounce entry.
pub type DebounceKey = (PathBuf, EventKind);

/// One observed change in the source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: EventKind,
    /// Current path of the item (the new path for renames).
    pub path: PathBuf,
    /// Previous path, present only for renames.
    pub previous: Option<PathBuf>,
}

impl ChangeEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: EventKind::Created,
            path: path.into(),
            previous: None,
        }
    }

    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: EventKind::Changed,
            path: path.into(),
            previous: None,
        }
    }

    pub fn renamed(previous: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: EventKind::Renamed,
            path: path.into(),
            previous: Some(previous.into()),
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: EventKind::Deleted,
            path: path.into(),
            previous: None,
        }
    }

    /// Coalescing identity: current path plus kind.
    pub fn key(&self) -> DebounceKey {
        (self.path.clone(), self.kind)
    }
}

/// Set of enabled event kinds
///
/// Empty config means "replicate everything"; that defaulting happens in
/// `Config::enabled_kinds`, not here - `EventMask::NONE` really is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask {
    bits: u8,
}

impl EventMask {
    pub const NONE: EventMask = EventMask { bits: 0 };
    pub const ALL: EventMask = EventMask { bits: 0b1111 };

    pub fn from_kinds(kinds: &[EventKind]) -> Self {
        let mut mask = Self::NONE;
        for kind in kinds {
            mask.insert(*kind);
        }
        mask
    }

    /// Parse a comma-separated list ("created,deleted"). Unknown names are
    /// skipped, matching how the original MANAGE_EVENTS list behaved.
    pub fn parse_list(list: &str) -> Self {
        let kinds: Vec<EventKind> = list.split(',').filter_map(EventKind::from_name).collect();
        Self::from_kinds(&kinds)
    }

    pub fn insert(&mut self, kind: EventKind) {
        self.bits |= kind.bit();
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.bits & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL_KINDS
            .iter()
            .copied()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.kinds().iter().map(|k| k.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}
