//! Watch session lifecycle
//!
//! A `WatchSession` ties the pieces together: a recursive `notify` watcher
//! feeds translated events through the exclusion filter into the
//! debouncer, whose expired entries are applied by a bounded pool of
//! replication workers. Sessions move Stopped -> Running -> Stopped;
//! `stop` detaches delivery immediately but lets pending replications
//! finish, and dropping the session joins everything.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::MirrorSettings;
use crate::debounce::{DebounceWindows, EventDebouncer};
use crate::engine::ReplicationEngine;
use crate::error::{HobbesError, HobbesResult};
use crate::event::{ChangeEvent, EventMask};
use crate::filter::ExcludeFilter;
use crate::logging::LogSink;
use crate::mapper::PathMapper;

/// Capacity of the dispatch queue between the debounce timer and the
/// replication workers. A full queue blocks the timer, which is fine:
/// the debounce table keeps coalescing while dispatch is saturated.
const DISPATCH_QUEUE_CAP: usize = 64;

/// Fixed-size worker pool applying dispatched events to the destination.
struct DispatchPool {
    workers: Vec<JoinHandle<()>>,
    sender: Option<SyncSender<ChangeEvent>>,
}

impl DispatchPool {
    /// Returns the pool and a submit handle for the debouncer's dispatch
    /// callback.
    fn new(worker_count: usize, engine: Arc<ReplicationEngine>) -> (Self, SyncSender<ChangeEvent>) {
        let (sender, receiver) = sync_channel::<ChangeEvent>(DISPATCH_QUEUE_CAP);
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..worker_count.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || worker_loop(receiver, engine))
            })
            .collect();
        let submit = sender.clone();
        (
            Self {
                workers,
                sender: Some(sender),
            },
            submit,
        )
    }
}

impl Drop for DispatchPool {
    /// Joining here requires that every outside submit handle is already
    /// gone; the runtime's field order guarantees the debouncer (which
    /// owns the last one) drops first.
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<ChangeEvent>>>, engine: Arc<ReplicationEngine>) {
    loop {
        let received = receiver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .recv();
        match received {
            Ok(event) => engine.apply(&event),
            Err(_) => break,
        }
    }
}

/// State shared with the notify callback.
struct NotificationContext {
    debouncer: Arc<EventDebouncer>,
    windows: DebounceWindows,
    mask: EventMask,
    exclude: Arc<ExcludeFilter>,
    mapper: PathMapper,
    log: Arc<dyn LogSink>,
}

impl NotificationContext {
    /// Runs on notify's delivery thread. Nothing here may block for long
    /// or panic; every failure becomes a log line.
    fn handle(&self, outcome: Result<Event, notify::Error>) {
        let event = match outcome {
            Ok(event) => event,
            Err(err) => {
                self.log.log(&format!("watch error: {err}"));
                return;
            }
        };
        if event.need_rescan() {
            self.log
                .log("notification buffer overflowed, some changes may not be mirrored");
        }
        for change in translate(&event) {
            if !self.mask.contains(change.kind) {
                continue;
            }
            if self.is_excluded(&change) {
                continue;
            }
            let window = self.windows.window_for(change.kind);
            self.debouncer.offer(change, window);
        }
    }

    fn is_excluded(&self, change: &ChangeEvent) -> bool {
        let relative = match self.mapper.relativize(&change.path) {
            Ok(relative) => relative,
            // Out-of-root paths are logged at dispatch, not silently here.
            Err(_) => return false,
        };
        self.exclude.is_excluded(&relative, change.path.is_dir())
    }
}

/// Map a raw notification onto replication events. Access and metadata
/// noise (other than write time) is dropped here, so disabled handlers
/// are simply never attached to anything downstream.
fn translate(event: &Event) -> Vec<ChangeEvent> {
    use notify::EventKind as Raw;

    match &event.kind {
        Raw::Create(_) => event.paths.iter().cloned().map(ChangeEvent::created).collect(),
        Raw::Remove(_) => event.paths.iter().cloned().map(ChangeEvent::deleted).collect(),
        Raw::Modify(ModifyKind::Name(mode)) => translate_rename(*mode, &event.paths),
        Raw::Modify(ModifyKind::Data(_))
        | Raw::Modify(ModifyKind::Any)
        | Raw::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
        | Raw::Modify(ModifyKind::Metadata(MetadataKind::Any)) => {
            event.paths.iter().cloned().map(ChangeEvent::changed).collect()
        }
        _ => Vec::new(),
    }
}

fn translate_rename(mode: RenameMode, paths: &[PathBuf]) -> Vec<ChangeEvent> {
    match mode {
        RenameMode::Both if paths.len() >= 2 => {
            vec![ChangeEvent::renamed(
                paths[0].clone(),
                paths[paths.len() - 1].clone(),
            )]
        }
        // Unpaired halves: the mirror still converges treating them as
        // remove-then-appear.
        RenameMode::From => paths.iter().cloned().map(ChangeEvent::deleted).collect(),
        RenameMode::To => paths.iter().cloned().map(ChangeEvent::created).collect(),
        // Backend could not say which side this is; let the filesystem
        // answer.
        _ => paths
            .iter()
            .map(|path| {
                if path.exists() {
                    ChangeEvent::created(path.clone())
                } else {
                    ChangeEvent::deleted(path.clone())
                }
            })
            .collect(),
    }
}

/// Everything that exists only while the session is running.
///
/// Field order is drop order: detach delivery, then drain the debounce
/// table (its `Drop` joins the timer), then join the workers.
struct SessionRuntime {
    watcher: Option<RecommendedWatcher>,
    debouncer: Arc<EventDebouncer>,
    pool: DispatchPool,
}

pub struct WatchSession {
    settings: MirrorSettings,
    log: Arc<dyn LogSink>,
    runtime: Option<SessionRuntime>,
    draining: Option<SessionRuntime>,
}

impl WatchSession {
    /// Settings arrive validated; construction never starts watching.
    pub fn new(settings: MirrorSettings, log: Arc<dyn LogSink>) -> HobbesResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            log,
            runtime: None,
            draining: None,
        })
    }

    pub fn running(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn source(&self) -> &Path {
        &self.settings.source
    }

    pub fn destination(&self) -> &Path {
        &self.settings.destination
    }

    pub fn events(&self) -> EventMask {
        self.settings.events
    }

    /// No-op while running: session configuration is immutable between
    /// `start` and `stop`.
    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        if self.running() {
            return;
        }
        self.settings.source = source.into();
    }

    pub fn set_destination(&mut self, destination: impl Into<PathBuf>) {
        if self.running() {
            return;
        }
        self.settings.destination = destination.into();
    }

    pub fn set_events(&mut self, events: EventMask) {
        if self.running() {
            return;
        }
        self.settings.events = events;
    }

    /// Idempotent. Builds the runtime and subscribes the watcher; any
    /// runtime retired by a previous `stop` is joined first.
    pub fn start(&mut self) -> HobbesResult<()> {
        if self.runtime.is_some() {
            return Ok(());
        }
        self.draining.take();

        if !self.settings.source.is_dir() {
            return Err(HobbesError::SourceMissing {
                path: self.settings.source.clone(),
            });
        }
        std::fs::create_dir_all(&self.settings.destination)?;

        let mapper = PathMapper::new(&self.settings.source, &self.settings.destination);
        let engine = Arc::new(ReplicationEngine::new(
            mapper.clone(),
            self.settings.retry,
            Arc::clone(&self.settings.exclude),
            Arc::clone(&self.log),
        ));
        let (pool, submit) = DispatchPool::new(self.settings.workers, engine);
        let debouncer = Arc::new(EventDebouncer::new(move |event| {
            // Blocking send is the backpressure: the timer waits, the
            // table keeps coalescing.
            let _ = submit.send(event);
        }));

        let context = NotificationContext {
            debouncer: Arc::clone(&debouncer),
            windows: self.settings.windows,
            mask: self.settings.events,
            exclude: Arc::clone(&self.settings.exclude),
            mapper,
            log: Arc::clone(&self.log),
        };
        let mut watcher = RecommendedWatcher::new(
            move |outcome: Result<Event, notify::Error>| context.handle(outcome),
            Config::default(),
        )
        .map_err(|e| HobbesError::Watch(e.to_string()))?;
        watcher
            .watch(&self.settings.source, RecursiveMode::Recursive)
            .map_err(|e| HobbesError::Watch(e.to_string()))?;

        self.log.log(&format!(
            "mirroring '{}' -> '{}'",
            self.settings.source.display(),
            self.settings.destination.display()
        ));
        self.runtime = Some(SessionRuntime {
            watcher: Some(watcher),
            debouncer,
            pool,
        });
        Ok(())
    }

    /// Idempotent, non-blocking. Delivery stops immediately; entries
    /// already accepted still dispatch and in-flight replications finish.
    /// The retired runtime is joined on the next `start` or on drop.
    pub fn stop(&mut self) {
        let mut runtime = match self.runtime.take() {
            Some(runtime) => runtime,
            None => return,
        };
        runtime.watcher.take();
        runtime.debouncer.close();
        // Replacing joins any runtime retired by an earlier stop.
        self.draining = Some(runtime);
        self.log.log("watch stopped, draining pending replications");
    }
}

impl Drop for WatchSession {
    /// Dropping a session is the drain barrier: every accepted event has
    /// been applied once this returns.
    fn drop(&mut self) {
        self.stop();
        self.draining.take();
    }
}
