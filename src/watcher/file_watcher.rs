//! Debounced file watcher with an explicit start/stop lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::WatchSettings;

use super::correlator::Correlator;
use super::debouncer::Debouncer;
use super::notifier::{EventSink, Notifier, NotifierFactory, RecommendedFactory};
use super::targets::{WatchMode, resolve_targets};
use super::{ChangeCallback, ErrorCallback, WatchError};

/// Debounce window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Lifecycle state of a [`FileWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Built, never started (or the last start failed).
    Idle,
    /// Targets registered, dispatch loop running.
    Active,
    /// Terminal. Build a new watcher to watch again.
    Stopped,
}

/// Live resources of a running watcher.
struct Subscription {
    notifier: Box<dyn Notifier>,
    debouncer: Debouncer,
    task: JoinHandle<()>,
}

enum Session {
    Idle,
    Active(Subscription),
    Stopped,
}

/// Watches a fixed set of files and reports each settled change once.
///
/// ```no_run
/// # async fn example() -> Result<(), fswatch::WatchError> {
/// let mut watcher = fswatch::FileWatcher::builder()
///     .path("/etc/myapp/config.toml")
///     .on_change(|path| println!("changed: {}", path.display()))
///     .build()?;
/// watcher.start()?;
/// // ...
/// watcher.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    paths: Arc<IndexSet<PathBuf>>,
    targets: Arc<IndexSet<PathBuf>>,
    mode: WatchMode,
    debounce: Duration,
    on_change: ChangeCallback,
    on_error: Option<ErrorCallback>,
    factory: Arc<dyn NotifierFactory>,
    runtime: Option<Handle>,
    session: Session,
}

impl FileWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> FileWatcherBuilder {
        FileWatcherBuilder::new()
    }

    /// Register all targets and launch the dispatch loop.
    ///
    /// Requires a Tokio runtime: the one given to the builder, or the
    /// ambient one. On failure nothing stays registered and the watcher
    /// remains idle.
    pub fn start(&mut self) -> Result<(), WatchError> {
        match self.session {
            Session::Idle => {}
            Session::Active(_) => return Err(WatchError::AlreadyStarted),
            Session::Stopped => return Err(WatchError::Stopped),
        }

        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|e| WatchError::InitFailed {
                reason: format!("no Tokio runtime available: {e}"),
            })?,
        };

        let (sink, streams) = EventSink::channel();
        let mut notifier = self.factory.open(sink).map_err(|e| WatchError::InitFailed {
            reason: e.to_string(),
        })?;

        for target in self.targets.iter() {
            // dropping `notifier` on the error path releases earlier registrations
            notifier
                .watch(target)
                .map_err(|source| WatchError::PathWatchFailed {
                    path: target.clone(),
                    source,
                })?;
            crate::debug_event!("watcher", "watching", "{}", target.display());
        }

        let debouncer = Debouncer::new(self.debounce, Arc::clone(&self.on_change));
        let correlator = Correlator::new(
            Arc::clone(&self.targets),
            Arc::clone(&self.paths),
            debouncer.clone(),
            self.on_error.clone(),
            streams,
        );
        let task = runtime.spawn(correlator.run());

        crate::log_event!(
            "watcher",
            "started",
            "{} paths via {} targets ({:?}, {}ms)",
            self.paths.len(),
            self.targets.len(),
            self.mode,
            self.debounce.as_millis()
        );

        self.session = Session::Active(Subscription {
            notifier,
            debouncer,
            task,
        });
        Ok(())
    }

    /// Release the notifier and end the session.
    ///
    /// Safe to call before `start` and more than once. Once it returns no
    /// new delay is armed and nothing is registered; a callback that is
    /// already running may still complete.
    pub fn stop(&mut self) -> Result<(), WatchError> {
        match std::mem::replace(&mut self.session, Session::Stopped) {
            Session::Active(subscription) => {
                let Subscription {
                    notifier,
                    debouncer,
                    task,
                } = subscription;
                let discarded = debouncer.close();
                // closes both streams; the loop exits on its own
                drop(notifier);
                drop(task);
                crate::log_event!("watcher", "stopped", "{discarded} pending discarded");
            }
            Session::Idle => {
                self.session = Session::Idle;
            }
            Session::Stopped => {}
        }
        Ok(())
    }

    pub fn state(&self) -> WatchState {
        match self.session {
            Session::Idle => WatchState::Idle,
            Session::Active(_) => WatchState::Active,
            Session::Stopped => WatchState::Stopped,
        }
    }

    /// Whether the dispatch loop is still consuming events.
    pub fn is_running(&self) -> bool {
        match &self.session {
            Session::Active(subscription) => !subscription.task.is_finished(),
            _ => false,
        }
    }

    /// Paths reported to the change callback.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Locations registered with the notifier.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(PathBuf::as_path)
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("paths", &self.paths)
            .field("targets", &self.targets)
            .field("mode", &self.mode)
            .field("debounce", &self.debounce)
            .field("state", &self.state())
            .finish()
    }
}

/// Builder for constructing a FileWatcher.
pub struct FileWatcherBuilder {
    paths: Vec<PathBuf>,
    mode: WatchMode,
    debounce: Duration,
    on_change: Option<ChangeCallback>,
    on_error: Option<ErrorCallback>,
    factory: Option<Arc<dyn NotifierFactory>>,
    runtime: Option<Handle>,
}

impl FileWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            mode: WatchMode::default(),
            debounce: DEFAULT_DEBOUNCE,
            on_change: None,
            on_error: None,
            factory: None,
            runtime: None,
        }
    }

    /// Add a path to watch. Must be absolute.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Add several paths to watch.
    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn mode(mut self, mode: WatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(WatchMode::Direct)` when `true`.
    pub fn direct(mut self, direct: bool) -> Self {
        self.mode = if direct {
            WatchMode::Direct
        } else {
            WatchMode::Indirect
        };
        self
    }

    /// Set the quiet period. Zero selects [`DEFAULT_DEBOUNCE`].
    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = if window.is_zero() {
            DEFAULT_DEBOUNCE
        } else {
            window
        };
        self
    }

    /// Set the debounce duration in milliseconds.
    pub fn debounce_ms(self, ms: u64) -> Self {
        self.debounce(Duration::from_millis(ms))
    }

    /// Set the change callback (required).
    ///
    /// Runs on the blocking pool. Different paths may be reported
    /// concurrently; the same path never overlaps with itself.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Set the error callback for lost watches and notifier errors.
    ///
    /// Runs inline on the dispatch loop and should return quickly.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WatchError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Use a custom notifier backend.
    pub fn notifier(mut self, factory: impl NotifierFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Spawn the dispatch loop on this runtime instead of the ambient one.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Apply mode and debounce from loaded settings, and add their paths.
    pub fn settings(self, settings: &WatchSettings) -> Self {
        self.paths(settings.paths.iter().cloned())
            .mode(settings.mode)
            .debounce_ms(settings.debounce_ms)
    }

    /// Build the FileWatcher.
    pub fn build(self) -> Result<FileWatcher, WatchError> {
        let on_change = self
            .on_change
            .ok_or_else(|| WatchError::invalid_config("change callback is required"))?;

        let targets = resolve_targets(&self.paths, self.mode)?;
        let paths: IndexSet<PathBuf> = self.paths.into_iter().collect();
        let factory: Arc<dyn NotifierFactory> = match self.factory {
            Some(factory) => factory,
            None => Arc::new(RecommendedFactory),
        };

        Ok(FileWatcher {
            paths: Arc::new(paths),
            targets: Arc::new(targets),
            mode: self.mode,
            debounce: self.debounce,
            on_change,
            on_error: self.on_error,
            factory,
            runtime: self.runtime,
            session: Session::Idle,
        })
    }
}

impl Default for FileWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
