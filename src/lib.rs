//! Debounced file change notification.
//!
//! Give [`FileWatcher`] a set of absolute file paths and a callback; the
//! callback runs once per settled change instead of once per raw event.
//! Files are watched through their parent directory by default so atomic
//! replace (write temp file, rename over) keeps working.

pub mod config;
pub mod logging;
pub mod watcher;

pub use config::{LoggingConfig, WatchSettings};
pub use watcher::{
    DEFAULT_DEBOUNCE, FileWatcher, FileWatcherBuilder, WatchError, WatchMode, WatchState,
};
