//! Tree comparator: brings a replica directory tree in line with a source tree.
//!
//! Each directory level is handled in two steps. First every replica entry
//! whose name is absent from the source, or whose kind differs from the
//! source entry of the same name, is removed. Then the source is listed
//! again and every entry is created, added, or compared by digest and
//! updated. Matching subdirectories go onto a worklist, so deep trees do
//! not grow the call stack.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::{EntryKind, LocalFs};
use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::hash::{same_content, DigestAlgorithm};

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Directory pairs compared.
    pub dirs_compared: usize,
    /// Replica entries removed.
    pub removed: usize,
    /// Replica directories created.
    pub created: usize,
    /// Files copied to a free replica path.
    pub added: usize,
    /// Stale replica files overwritten.
    pub updated: usize,
    /// Files whose digests already matched.
    pub unchanged: usize,
}

impl PassStats {
    /// Number of mutations applied to the replica.
    pub fn mutations(&self) -> usize {
        self.removed + self.created + self.added + self.updated
    }
}

/// Compares a source tree against a replica and applies the difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeComparator {
    algorithm: DigestAlgorithm,
}

impl TreeComparator {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Run one full pass over `(source_root, replica_root)`.
    ///
    /// Both roots must already exist as directories. The first filesystem
    /// error aborts the pass; whatever was applied before it stays applied.
    pub fn run_pass(
        &self,
        source_root: &Path,
        replica_root: &Path,
        sink: &mut dyn EventSink,
    ) -> Result<PassStats> {
        sink.emit(SyncEvent::Comparing {
            replica: replica_root.to_path_buf(),
            source: source_root.to_path_buf(),
        });

        let mut stats = PassStats::default();
        let mut worklist = vec![(source_root.to_path_buf(), replica_root.to_path_buf())];

        while let Some((source_dir, replica_dir)) = worklist.pop() {
            let subdirs = self.sync_level(&source_dir, &replica_dir, sink, &mut stats)?;
            // Reversed so the next pop takes the first subdirectory by name
            worklist.extend(subdirs.into_iter().rev());
        }

        tracing::debug!(
            dirs = stats.dirs_compared,
            removed = stats.removed,
            created = stats.created,
            added = stats.added,
            updated = stats.updated,
            unchanged = stats.unchanged,
            "pass complete"
        );

        Ok(stats)
    }

    /// Synchronize the immediate children of one directory pair and return
    /// the subdirectory pairs still to visit.
    fn sync_level(
        &self,
        source_dir: &Path,
        replica_dir: &Path,
        sink: &mut dyn EventSink,
        stats: &mut PassStats,
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        stats.dirs_compared += 1;
        tracing::trace!("comparing level {}", replica_dir.display());

        let source_entries = LocalFs::list_dir(source_dir)?;
        // Replica links are never followed, so they always count as mismatches
        let replica_entries = LocalFs::list_dir_nofollow(replica_dir)?;

        let source_kinds: HashMap<&OsStr, EntryKind> = source_entries
            .iter()
            .map(|e| (e.name.as_os_str(), e.kind))
            .collect();

        // Removals come first so nothing created below is deleted again
        for entry in &replica_entries {
            match source_kinds.get(entry.name.as_os_str()) {
                Some(kind) if *kind == entry.kind => {}
                _ => self.remove(&replica_dir.join(&entry.name), sink, stats)?,
            }
        }

        // The source may have changed while we were deleting
        let source_entries = LocalFs::list_dir(source_dir)?;
        let mut subdirs = Vec::new();

        for entry in source_entries {
            let source_path = source_dir.join(&entry.name);
            let replica_path = replica_dir.join(&entry.name);
            let existing = LocalFs::kind_of_nofollow(&replica_path)?;

            match entry.kind {
                EntryKind::Directory => {
                    if matches!(existing, Some(EntryKind::File | EntryKind::Other)) {
                        self.remove(&replica_path, sink, stats)?;
                    }
                    if existing != Some(EntryKind::Directory) {
                        LocalFs::create_dir(&replica_path)?;
                        stats.created += 1;
                        sink.emit(SyncEvent::Creating {
                            path: replica_path.clone(),
                        });
                    }
                    subdirs.push((source_path, replica_path));
                }
                EntryKind::File => match existing {
                    Some(EntryKind::File) => {
                        if same_content(&source_path, &replica_path, self.algorithm)? {
                            stats.unchanged += 1;
                        } else {
                            LocalFs::copy_file(&source_path, &replica_path)?;
                            stats.updated += 1;
                            sink.emit(SyncEvent::Updating { path: replica_path });
                        }
                    }
                    Some(EntryKind::Directory | EntryKind::Other) => {
                        self.remove(&replica_path, sink, stats)?;
                        self.add(&source_path, replica_path, sink, stats)?;
                    }
                    None => self.add(&source_path, replica_path, sink, stats)?,
                },
                // Source listings follow links
                EntryKind::Other => {}
            }
        }

        Ok(subdirs)
    }

    fn remove(&self, path: &Path, sink: &mut dyn EventSink, stats: &mut PassStats) -> Result<()> {
        LocalFs::delete(path)?;
        stats.removed += 1;
        sink.emit(SyncEvent::Removing {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn add(
        &self,
        source_path: &Path,
        replica_path: PathBuf,
        sink: &mut dyn EventSink,
        stats: &mut PassStats,
    ) -> Result<()> {
        LocalFs::copy_file(source_path, &replica_path)?;
        stats.added += 1;
        sink.emit(SyncEvent::Adding { path: replica_path });
        Ok(())
    }
}
