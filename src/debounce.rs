//! Event coalescing
//!
//! Filesystem watchers fire in bursts: one save in an editor can produce
//! several Changed notifications for the same path within milliseconds.
//! The debouncer holds one pending entry per `(path, kind)` and dispatches
//! it once its window expires; duplicates arriving while an entry is live
//! are dropped. Dispatch happens on the debouncer's own timer thread,
//! never on the watcher's delivery thread.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::event::{ChangeEvent, DebounceKey, EventKind};

/// Default coalescing window in milliseconds.
pub const DEBOUNCE_WINDOW_MS: u64 = 1000;

/// How often the timer thread sweeps the table.
const TICK: Duration = Duration::from_millis(20);

/// Per-kind debounce windows. Deletes get half the window: a delete is
/// usually final, and dispatching it early lets a follow-up create of the
/// same name land on a clean destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceWindows {
    pub window: Duration,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(DEBOUNCE_WINDOW_MS),
        }
    }
}

impl DebounceWindows {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window_for(&self, kind: EventKind) -> Duration {
        match kind {
            EventKind::Deleted => self.window / 2,
            _ => self.window,
        }
    }
}

struct PendingEntry {
    event: ChangeEvent,
    expires_at: Instant,
}

struct DebounceState {
    table: HashMap<DebounceKey, PendingEntry>,
    closed: bool,
}

pub struct EventDebouncer {
    state: Arc<Mutex<DebounceState>>,
    timer: Option<JoinHandle<()>>,
}

impl EventDebouncer {
    /// Spawn the timer thread. `dispatch` is invoked once per expired
    /// entry, on the timer thread.
    pub fn new<F>(dispatch: F) -> Self
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(DebounceState {
            table: HashMap::new(),
            closed: false,
        }));
        let timer_state = Arc::clone(&state);
        let timer = std::thread::spawn(move || run_timer(timer_state, dispatch));
        Self {
            state,
            timer: Some(timer),
        }
    }

    /// Insert-if-absent. Returns whether the event was accepted as a new
    /// entry; a duplicate key keeps the first event's payload and window.
    /// After `close` every offer is dropped.
    pub fn offer(&self, event: ChangeEvent, window: Duration) -> bool {
        let mut state = lock(&self.state);
        if state.closed {
            return false;
        }
        match state.table.entry(event.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    event,
                    expires_at: Instant::now() + window,
                });
                true
            }
        }
    }

    /// Number of live entries.
    pub fn pending(&self) -> usize {
        lock(&self.state).table.len()
    }

    /// Stop accepting new entries. Entries already in the table still
    /// dispatch; the timer exits once the table drains.
    pub fn close(&self) {
        lock(&self.state).closed = true;
    }
}

impl Drop for EventDebouncer {
    /// Dropping the debouncer is a drain barrier: it closes the table and
    /// joins the timer, so every accepted entry has been dispatched by the
    /// time `drop` returns.
    fn drop(&mut self) {
        self.close();
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

fn lock(state: &Mutex<DebounceState>) -> MutexGuard<'_, DebounceState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn run_timer<F>(state: Arc<Mutex<DebounceState>>, dispatch: F)
where
    F: Fn(ChangeEvent),
{
    loop {
        let now = Instant::now();
        let (mut expired, done) = {
            let mut state = lock(&state);
            let keys: Vec<DebounceKey> = state
                .table
                .iter()
                .filter(|(_, entry)| entry.expires_at <= now)
                .map(|(key, _)| key.clone())
                .collect();
            let expired: Vec<PendingEntry> = keys
                .iter()
                .filter_map(|key| state.table.remove(key))
                .collect();
            // Exit is decided under the same lock that rejects new offers,
            // so a closed, drained table cannot gain entries afterwards.
            let done = state.closed && state.table.is_empty();
            (expired, done)
        };
        expired.sort_by_key(|entry| entry.expires_at);
        for entry in expired {
            dispatch(entry.event);
        }
        if done {
            return;
        }
        std::thread::sleep(TICK);
    }
}
