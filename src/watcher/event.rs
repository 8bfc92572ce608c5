//! Raw file system events as seen by the correlator.
//!
//! `notify` reports rich, platform-specific event kinds. The correlator only
//! cares about five operations, so every `notify::Event` is flattened into
//! one [`RawEvent`] per affected path.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use notify::event::{EventKind, ModifyKind, RenameMode};

bitflags! {
    /// File system operations reported for a single path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Op: u8 {
        const CREATE = 1;
        const WRITE = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD = 1 << 4;
    }
}

/// A single `(path, operation)` pair from the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub op: Op,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }

    /// Check whether any of the given operations is present.
    pub fn has(&self, op: Op) -> bool {
        self.op.intersects(op)
    }

    /// Flatten a `notify` event into raw events.
    ///
    /// Rename halves follow inotify semantics: the old name is reported as
    /// `RENAME` and the new name as `CREATE`. Backends that cannot tell the
    /// halves apart (FSEvents) are resolved by checking whether the path
    /// still exists.
    pub fn from_notify(event: notify::Event) -> Vec<RawEvent> {
        let notify::Event { kind, paths, .. } = event;

        match kind {
            EventKind::Create(_) => with_op(paths, Op::CREATE),
            EventKind::Remove(_) => with_op(paths, Op::REMOVE),
            EventKind::Modify(ModifyKind::Metadata(_)) => with_op(paths, Op::CHMOD),
            EventKind::Modify(ModifyKind::Name(mode)) => from_rename(mode, paths),
            EventKind::Modify(_) => with_op(paths, Op::WRITE),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        }
    }
}

fn with_op(paths: Vec<PathBuf>, op: Op) -> Vec<RawEvent> {
    paths.into_iter().map(|path| RawEvent { path, op }).collect()
}

fn from_rename(mode: RenameMode, paths: Vec<PathBuf>) -> Vec<RawEvent> {
    match mode {
        RenameMode::From => with_op(paths, Op::RENAME),
        RenameMode::To => with_op(paths, Op::CREATE),
        RenameMode::Both => {
            let mut paths = paths.into_iter();
            let mut events = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                events.push(RawEvent::new(from, Op::RENAME));
            }
            if let Some(to) = paths.next() {
                events.push(RawEvent::new(to, Op::CREATE));
            }
            events
        }
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|path| {
                let op = rename_side(&path);
                RawEvent { path, op }
            })
            .collect(),
    }
}

fn rename_side(path: &Path) -> Op {
    if path.exists() {
        Op::CREATE
    } else {
        Op::RENAME
    }
}
