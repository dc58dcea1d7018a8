//! Structured notifications emitted while synchronizing.
//!
//! The core never decides where these go. Callers pass an [`EventSink`]
//! and own its lifecycle.

use std::fmt;
use std::path::{Path, PathBuf};

/// Severity attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// One notification from a pass or from the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A pass started comparing `replica` against `source`.
    Comparing { replica: PathBuf, source: PathBuf },
    /// A replica entry was deleted.
    Removing { path: PathBuf },
    /// A replica directory was created.
    Creating { path: PathBuf },
    /// A file was copied to a replica path that had no file.
    Adding { path: PathBuf },
    /// A stale replica file was overwritten.
    Updating { path: PathBuf },
    /// The driver is about to sleep between passes.
    Sleeping { seconds: u64 },
    /// A pass failed and the loop is carrying on.
    PassFailed { message: String },
}

impl SyncEvent {
    pub fn severity(&self) -> Severity {
        match self {
            SyncEvent::Comparing { .. } | SyncEvent::Sleeping { .. } => Severity::Info,
            SyncEvent::Removing { .. }
            | SyncEvent::Creating { .. }
            | SyncEvent::Adding { .. }
            | SyncEvent::Updating { .. } => Severity::Warn,
            SyncEvent::PassFailed { .. } => Severity::Error,
        }
    }

    /// Whether this event reports a change to the replica.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            SyncEvent::Removing { .. }
                | SyncEvent::Creating { .. }
                | SyncEvent::Adding { .. }
                | SyncEvent::Updating { .. }
        )
    }

    /// Replica path touched by a mutating event.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SyncEvent::Removing { path }
            | SyncEvent::Creating { path }
            | SyncEvent::Adding { path }
            | SyncEvent::Updating { path } => Some(path),
            _ => None,
        }
    }

    /// Rendered message, without severity.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Comparing { replica, source } => {
                write!(f, "comparing {} against {}", replica.display(), source.display())
            }
            SyncEvent::Removing { path } => write!(f, "removing {}", path.display()),
            SyncEvent::Creating { path } => write!(f, "creating {}", path.display()),
            SyncEvent::Adding { path } => write!(f, "adding {}", path.display()),
            SyncEvent::Updating { path } => write!(f, "updating {}", path.display()),
            SyncEvent::Sleeping { seconds } => write!(f, "sleeping {} seconds", seconds),
            SyncEvent::PassFailed { message } => {
                write!(f, "synchronization pass failed: {}", message)
            }
        }
    }
}

/// Receiver for events, called synchronously as actions happen.
pub trait EventSink {
    fn emit(&mut self, event: SyncEvent);
}

impl<F> EventSink for F
where
    F: FnMut(SyncEvent),
{
    fn emit(&mut self, event: SyncEvent) {
        self(event)
    }
}

/// Records every event, mostly useful in tests.
impl EventSink for Vec<SyncEvent> {
    fn emit(&mut self, event: SyncEvent) {
        self.push(event);
    }
}

/// Forwards events to another thread. A disconnected receiver is ignored.
impl EventSink for crossbeam_channel::Sender<SyncEvent> {
    fn emit(&mut self, event: SyncEvent) {
        let _ = self.send(event);
    }
}

/// Forwards events to `tracing` at the level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: SyncEvent) {
        match event.severity() {
            Severity::Info => tracing::info!("{}", event),
            Severity::Warn => tracing::warn!("{}", event),
            Severity::Error => tracing::error!("{}", event),
        }
    }
}
