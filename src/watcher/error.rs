//! Error types for the file watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
///
/// `InvalidConfig`, `InitFailed`, `PathWatchFailed`, `AlreadyStarted` and
/// `Stopped` are returned synchronously. `WatchLost` and `Notify` only ever
/// reach the error callback (and the log) once the watcher is running.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid watcher configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {source}")]
    PathWatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watcher is already running")]
    AlreadyStarted,

    #[error("Watcher has been stopped and cannot be restarted")]
    Stopped,

    #[error("Watch target removed: {path}")]
    WatchLost { path: PathBuf },

    #[error("File system event error: {0}")]
    Notify(#[from] notify::Error),
}

impl WatchError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        WatchError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
