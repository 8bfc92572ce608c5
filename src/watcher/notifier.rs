//! Seam between the correlator and the OS notification primitive.
//!
//! A [`NotifierFactory`] opens a fresh [`Notifier`] handle per watch session.
//! The handle pushes raw events and errors into an [`EventSink`]; dropping
//! the handle must drop the sink so that both streams close and the
//! dispatch loop can exit.

use std::path::Path;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::event::RawEvent;

/// Capacity of the event and error channels.
pub const CHANNEL_CAPACITY: usize = 100;

/// Live handle to an OS-level notifier.
pub trait Notifier: Send {
    /// Register a single location (non-recursive).
    fn watch(&mut self, target: &Path) -> notify::Result<()>;
}

/// Opens notifier handles bound to an [`EventSink`].
pub trait NotifierFactory: Send + Sync {
    fn open(&self, sink: EventSink) -> notify::Result<Box<dyn Notifier>>;
}

/// Sending halves of the event and error streams.
#[derive(Debug, Clone)]
pub struct EventSink {
    events: mpsc::Sender<RawEvent>,
    errors: mpsc::Sender<notify::Error>,
}

/// Receiving halves, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventStreams {
    pub events: mpsc::Receiver<RawEvent>,
    pub errors: mpsc::Receiver<notify::Error>,
}

impl EventSink {
    /// Create a sink and the matching streams.
    pub fn channel() -> (EventSink, EventStreams) {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            EventSink {
                events: event_tx,
                errors: error_tx,
            },
            EventStreams {
                events: event_rx,
                errors: error_rx,
            },
        )
    }

    /// Forward a raw event from a non-async context.
    ///
    /// Returns `false` once the dispatch loop is gone.
    pub fn send_event(&self, event: RawEvent) -> bool {
        self.events.blocking_send(event).is_ok()
    }

    /// Forward a notifier error from a non-async context.
    pub fn send_error(&self, error: notify::Error) -> bool {
        self.errors.blocking_send(error).is_ok()
    }

    /// Async variant of [`EventSink::send_event`].
    pub async fn event(&self, event: RawEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Async variant of [`EventSink::send_error`].
    pub async fn error(&self, error: notify::Error) -> bool {
        self.errors.send(error).await.is_ok()
    }

    /// Translate and forward a `notify` callback result.
    fn forward(&self, res: notify::Result<Event>) {
        match res {
            Ok(event) => {
                for raw in RawEvent::from_notify(event) {
                    if !self.send_event(raw) {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = self.send_error(e);
            }
        }
    }
}

/// Notifier backed by `notify::RecommendedWatcher`.
pub struct RecommendedNotifier {
    watcher: notify::RecommendedWatcher,
}

impl Notifier for RecommendedNotifier {
    fn watch(&mut self, target: &Path) -> notify::Result<()> {
        self.watcher.watch(target, RecursiveMode::NonRecursive)
    }
}

/// Factory for the platform's recommended backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecommendedFactory;

impl NotifierFactory for RecommendedFactory {
    fn open(&self, sink: EventSink) -> notify::Result<Box<dyn Notifier>> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            sink.forward(res);
        })?;
        Ok(Box::new(RecommendedNotifier { watcher }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::event::Op;

    #[tokio::test]
    async fn test_streams_close_when_sink_dropped() {
        let (sink, mut streams) = EventSink::channel();

        assert!(sink.event(RawEvent::new("/a/b", Op::WRITE)).await);
        assert!(sink.error(notify::Error::generic("overflow")).await);
        drop(sink);

        assert_eq!(
            streams.events.recv().await,
            Some(RawEvent::new("/a/b", Op::WRITE))
        );
        assert!(streams.events.recv().await.is_none());
        assert!(streams.errors.recv().await.is_some());
        assert!(streams.errors.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_fails_after_streams_dropped() {
        let (sink, streams) = EventSink::channel();
        drop(streams);

        assert!(!sink.event(RawEvent::new("/a/b", Op::CREATE)).await);
    }

    #[test]
    fn test_recommended_factory_rejects_missing_target() {
        let (sink, _streams) = EventSink::channel();
        let mut notifier = RecommendedFactory.open(sink).unwrap();
        let temp_dir = tempfile::TempDir::new().unwrap();

        assert!(notifier.watch(temp_dir.path()).is_ok());
        assert!(notifier.watch(&temp_dir.path().join("missing")).is_err());
    }
}
