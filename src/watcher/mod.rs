//! Debounced file watcher.
//!
//! Watches a fixed set of files and calls back once per settled change,
//! collapsing bursts of writes into a single notification.
//!
//! # Architecture
//!
//! ```text
//! FileWatcher (start / stop)
//!   - resolve_targets: files (direct) or parent dirs (indirect)
//!   - Notifier: notify::RecommendedWatcher behind a trait
//!         |
//!    events + errors (two mpsc streams)
//!         |
//!   Correlator (one dispatch task)
//!     - target renamed/removed -> WatchLost to on_error
//!     - watched path created/written -> Debouncer
//!         |
//!   Debouncer (one timer task per pending path)
//!     - on_change(path) on the blocking pool
//! ```

mod correlator;
mod debouncer;
mod error;
mod event;
mod file_watcher;
mod notifier;
mod targets;

use std::path::Path;
use std::sync::Arc;

pub use correlator::{Disposition, classify};
pub use debouncer::{Debouncer, Recorded};
pub use error::WatchError;
pub use event::{Op, RawEvent};
pub use file_watcher::{DEFAULT_DEBOUNCE, FileWatcher, FileWatcherBuilder, WatchState};
pub use notifier::{
    CHANNEL_CAPACITY, EventSink, EventStreams, Notifier, NotifierFactory, RecommendedFactory,
    RecommendedNotifier,
};
pub use targets::{WatchMode, resolve_targets};

/// Callback invoked with the path that settled.
pub type ChangeCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// Callback invoked for lost watches and notifier errors.
pub type ErrorCallback = Arc<dyn Fn(&WatchError) + Send + Sync>;
