//! Synchronization driver.
//!
//! Validates the two roots, then runs the tree comparator once or on a fixed
//! polling interval. Sleeping happens after a pass completes, so the pass
//! duration adds to the effective period.

use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::sync::comparator::{PassStats, TreeComparator};
use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::hash::DigestAlgorithm;

/// What to do when a pass fails while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// End the polling session with the error.
    #[default]
    Abort,
    /// Report the error and try again after the next sleep.
    Continue,
}

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Validating,
    Syncing,
    Sleeping,
    Done,
    Fatal,
}

/// Suspends the driver between passes.
pub trait Sleeper {
    /// Sleep for `duration`. `Break` ends the polling loop.
    fn sleep(&mut self, duration: Duration) -> ControlFlow<()>;
}

/// Blocks the current thread; never ends the loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) -> ControlFlow<()> {
        std::thread::sleep(duration);
        ControlFlow::Continue(())
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Passes that completed without error.
    pub passes: u64,
    /// Passes that failed under [`ErrorPolicy::Continue`].
    pub failed_passes: u64,
    /// Statistics of the last successful pass.
    pub last: PassStats,
}

/// Runs the comparator over one source/replica pair.
#[derive(Debug)]
pub struct SyncDriver {
    source: PathBuf,
    replica: PathBuf,
    poll_interval: u64,
    error_policy: ErrorPolicy,
    comparator: TreeComparator,
    state: DriverState,
}

impl SyncDriver {
    /// `poll_interval` is in seconds; 0 runs a single pass.
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>, poll_interval: u64) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            poll_interval,
            error_policy: ErrorPolicy::default(),
            comparator: TreeComparator::default(),
            state: DriverState::Idle,
        }
    }

    /// Build a driver from resolved configuration.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.source, &config.replica, config.poll_interval)
            .with_algorithm(config.digest)
            .with_error_policy(config.error_policy)
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.comparator = TreeComparator::new(algorithm);
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.poll_interval > 0
    }

    /// Run until done, sleeping with the current thread between passes.
    ///
    /// In polling mode this only returns on error.
    pub fn run(&mut self, sink: &mut dyn EventSink) -> Result<RunSummary> {
        self.run_with_sleeper(sink, &mut ThreadSleeper)
    }

    /// Run until done, using `sleeper` between passes.
    pub fn run_with_sleeper(
        &mut self,
        sink: &mut dyn EventSink,
        sleeper: &mut dyn Sleeper,
    ) -> Result<RunSummary> {
        let (source, replica) = self.validate()?;
        let mut summary = RunSummary::default();

        loop {
            self.transition(DriverState::Syncing);

            match self.comparator.run_pass(&source, &replica, sink) {
                Ok(stats) => {
                    summary.passes += 1;
                    summary.last = stats;
                }
                Err(err) if self.is_polling() && self.error_policy == ErrorPolicy::Continue => {
                    summary.failed_passes += 1;
                    sink.emit(SyncEvent::PassFailed {
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    self.transition(DriverState::Fatal);
                    return Err(err);
                }
            }

            if !self.is_polling() {
                self.transition(DriverState::Done);
                return Ok(summary);
            }

            sink.emit(SyncEvent::Sleeping {
                seconds: self.poll_interval,
            });
            self.transition(DriverState::Sleeping);

            if sleeper
                .sleep(Duration::from_secs(self.poll_interval))
                .is_break()
            {
                self.transition(DriverState::Done);
                return Ok(summary);
            }
        }
    }

    /// Check the source, create the replica if needed, and resolve both
    /// roots to absolute paths.
    fn validate(&mut self) -> Result<(PathBuf, PathBuf)> {
        self.transition(DriverState::Validating);

        match self.check_roots() {
            Ok(roots) => Ok(roots),
            Err(err) => {
                self.transition(DriverState::Fatal);
                Err(err)
            }
        }
    }

    fn check_roots(&self) -> Result<(PathBuf, PathBuf)> {
        check_source(&self.source)?;
        ensure_replica(&self.replica)?;

        let source = fs::canonicalize(&self.source)
            .map_err(|e| SyncError::SourceUnreadable { path: self.source.clone(), source: e })?;
        let replica = fs::canonicalize(&self.replica)
            .map_err(|e| SyncError::ReplicaCreate { path: self.replica.clone(), source: e })?;

        Ok((source, replica))
    }

    fn transition(&mut self, next: DriverState) {
        tracing::trace!("driver state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn check_source(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SyncError::SourceMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(SyncError::SourceUnreadable {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    if !metadata.is_dir() {
        return Err(SyncError::SourceNotDirectory {
            path: path.to_path_buf(),
        });
    }

    fs::read_dir(path).map_err(|e| SyncError::SourceUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

fn ensure_replica(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::ReplicaNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("creating replica folder {}", path.display());
            fs::create_dir(path).map_err(|e| SyncError::ReplicaCreate {
                path: path.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(SyncError::ReplicaCreate {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
