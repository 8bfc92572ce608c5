//! Dispatch loop that turns raw notifier output into debounced changes.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexSet;

use super::debouncer::{Debouncer, Recorded};
use super::event::{Op, RawEvent};
use super::notifier::EventStreams;
use super::{ErrorCallback, WatchError};

/// What the correlator does with a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A registered target was renamed or removed.
    WatchLost,
    /// A watched path was created or written.
    Change,
    /// Anything else (siblings, the directory itself, chmod, ...).
    Ignore,
}

/// Classify a raw event against the registered targets and watched paths.
///
/// Watch loss is checked first, so in direct mode a removed file is
/// reported as lost rather than treated as a change.
pub fn classify(event: &RawEvent, targets: &IndexSet<PathBuf>, paths: &IndexSet<PathBuf>) -> Disposition {
    if targets.contains(&event.path) && event.has(Op::RENAME | Op::REMOVE) {
        Disposition::WatchLost
    } else if paths.contains(&event.path) && event.has(Op::CREATE | Op::WRITE) {
        Disposition::Change
    } else {
        Disposition::Ignore
    }
}

/// Owns the receiving side of one watch session.
pub(crate) struct Correlator {
    targets: Arc<IndexSet<PathBuf>>,
    paths: Arc<IndexSet<PathBuf>>,
    debouncer: Debouncer,
    on_error: Option<ErrorCallback>,
    streams: EventStreams,
}

impl Correlator {
    pub(crate) fn new(
        targets: Arc<IndexSet<PathBuf>>,
        paths: Arc<IndexSet<PathBuf>>,
        debouncer: Debouncer,
        on_error: Option<ErrorCallback>,
        streams: EventStreams,
    ) -> Self {
        Self {
            targets,
            paths,
            debouncer,
            on_error,
            streams,
        }
    }

    /// Consume both streams until they are closed.
    pub(crate) async fn run(mut self) {
        let mut events_open = true;
        let mut errors_open = true;

        while events_open || errors_open {
            tokio::select! {
                event = self.streams.events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        crate::debug_event!("watcher", "event stream closed");
                        events_open = false;
                    }
                },
                error = self.streams.errors.recv(), if errors_open => match error {
                    Some(error) => self.report(WatchError::Notify(error)),
                    None => {
                        crate::debug_event!("watcher", "error stream closed");
                        errors_open = false;
                    }
                },
            }
        }

        let discarded = self.debouncer.close();
        crate::debug_event!("watcher", "loop exited", "{discarded} pending discarded");
    }

    fn handle_event(&self, event: RawEvent) {
        match classify(&event, &self.targets, &self.paths) {
            Disposition::WatchLost => {
                self.report(WatchError::WatchLost { path: event.path });
            }
            Disposition::Change => match self.debouncer.record(event.path.clone()) {
                Recorded::Armed => {
                    crate::debug_event!("watcher", "armed", "{}", event.path.display());
                }
                Recorded::Reset => {
                    tracing::trace!("[watcher] reset: {}", event.path.display());
                }
                Recorded::Closed => {
                    tracing::trace!("[watcher] closed, dropped: {}", event.path.display());
                }
            },
            Disposition::Ignore => {
                tracing::trace!("[watcher] ignored {:?}: {}", event.op, event.path.display());
            }
        }
    }

    /// Log an asynchronous failure and forward it to the error callback.
    ///
    /// A panic in the callback is logged and swallowed; the loop keeps going.
    fn report(&self, error: WatchError) {
        tracing::error!("[watcher] {error}");
        let Some(on_error) = &self.on_error else {
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| on_error(&error))) {
            tracing::error!(
                "[watcher] error callback panicked on '{error}': {}",
                panic_message(panic.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string payload"
    }
}
