//! Per-path debouncing of change events.
//!
//! Debouncing collapses a burst of writes (editor save, atomic replace,
//! formatter pass) into a single callback once the path has been quiet for
//! the configured window.
//!
//! Each pending path owns one timer task. Recording a change either arms a
//! new entry (spawning the task) or pushes the existing deadline out. The
//! task fires the callback on the blocking pool and only then removes the
//! entry, so a change that lands while the callback runs re-arms the same
//! task instead of being lost.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{Duration, Instant, sleep_until};

use super::ChangeCallback;

/// Outcome of [`Debouncer::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// First change for the path, a new delay was armed.
    Armed,
    /// A delay was already pending and has been pushed out.
    Reset,
    /// The debouncer is closed, the change was dropped.
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct PendingState {
    entries: HashMap<PathBuf, Pending>,
    generation: u64,
    closed: bool,
}

/// Debounces change events by path.
#[derive(Clone)]
pub struct Debouncer {
    state: Arc<Mutex<PendingState>>,
    window: Duration,
    callback: ChangeCallback,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Debouncer {
    /// Create a debouncer that calls `callback` once a path has been quiet
    /// for `window`.
    pub fn new(window: Duration, callback: ChangeCallback) -> Self {
        Self {
            state: Arc::new(Mutex::new(PendingState::default())),
            window,
            callback,
        }
    }

    /// Record a change for `path`, arming or resetting its delay.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn record(&self, path: PathBuf) -> Recorded {
        let armed = {
            let mut state = self.state.lock();
            if state.closed {
                return Recorded::Closed;
            }

            state.generation += 1;
            let pending = Pending {
                deadline: Instant::now() + self.window,
                generation: state.generation,
            };

            match state.entries.entry(path) {
                Entry::Occupied(mut entry) => {
                    entry.insert(pending);
                    None
                }
                Entry::Vacant(entry) => {
                    let path = entry.key().clone();
                    entry.insert(pending);
                    Some(path)
                }
            }
        };

        match armed {
            Some(path) => {
                tokio::spawn(self.clone().settle(path));
                Recorded::Armed
            }
            None => Recorded::Reset,
        }
    }

    /// Stop accepting changes and discard every pending delay.
    ///
    /// Timer tasks notice the missing entry and exit without firing.
    /// Returns the number of discarded delays.
    pub fn close(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let discarded = state.entries.len();
        state.entries.clear();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Check if there are any pending changes.
    pub fn has_pending(&self) -> bool {
        !self.state.lock().entries.is_empty()
    }

    /// Get the number of pending changes.
    pub fn pending_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn snapshot(&self, path: &Path) -> Option<Pending> {
        self.state.lock().entries.get(path).copied()
    }

    /// Timer task for one path.
    async fn settle(self, path: PathBuf) {
        loop {
            let Some(armed) = self.snapshot(&path) else {
                return;
            };
            sleep_until(armed.deadline).await;

            match self.snapshot(&path) {
                Some(current) if current.generation == armed.generation => {}
                Some(_) => continue,
                None => return,
            }

            let callback = Arc::clone(&self.callback);
            let fired = path.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || callback(&fired)).await {
                tracing::error!("[debounce] change callback failed for {}: {e}", path.display());
            }

            let mut state = self.state.lock();
            let settled = match state.entries.get(&path) {
                Some(current) => current.generation == armed.generation,
                None => return,
            };
            if settled {
                state.entries.remove(&path);
                return;
            }
            // changed again while the callback ran; wait for the new deadline
        }
    }
}
