use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::fs::types::{DirectoryEntry, EntryKind};

/// Blocking operations on the local filesystem used by a synchronization pass.
pub struct LocalFs;

impl LocalFs {
    /// List the immediate children of a source directory, sorted by name.
    ///
    /// Hidden entries are included. Symbolic links report the kind of their
    /// target; a dangling link is reported as a file.
    pub fn list_dir(path: &Path) -> Result<Vec<DirectoryEntry>> {
        Self::list_with(path, Self::kind_of)
    }

    /// List the immediate children of a replica directory, sorted by name,
    /// without following symbolic links.
    pub fn list_dir_nofollow(path: &Path) -> Result<Vec<DirectoryEntry>> {
        Self::list_with(path, Self::kind_of_nofollow)
    }

    fn list_with(
        path: &Path,
        classify: fn(&Path) -> Result<Option<EntryKind>>,
    ) -> Result<Vec<DirectoryEntry>> {
        let read_dir = fs::read_dir(path).map_err(|e| SyncError::io(e, "listing", path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::io(e, "listing", path))?;
            let entry_path = entry.path();
            let kind = classify(&entry_path)?.ok_or_else(|| {
                SyncError::io(io::ErrorKind::NotFound.into(), "inspecting", &entry_path)
            })?;

            entries.push(DirectoryEntry::new(entry.file_name(), kind));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    /// Kind of whatever sits at `path` after following links, or `None` if
    /// nothing does.
    pub fn kind_of(path: &Path) -> Result<Option<EntryKind>> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // A dangling link still occupies the name
                match fs::symlink_metadata(path) {
                    Ok(_) => Ok(Some(EntryKind::File)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(SyncError::io(e, "inspecting", path)),
                }
            }
            Err(e) => Err(SyncError::io(e, "inspecting", path)),
        }
    }

    /// Kind of the entry at `path` itself. Links are never followed and are
    /// reported as `Other`, whatever they point at.
    pub fn kind_of_nofollow(path: &Path) -> Result<Option<EntryKind>> {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(metadata) if metadata.is_file() => Ok(Some(EntryKind::File)),
            Ok(_) => Ok(Some(EntryKind::Other)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::io(e, "inspecting", path)),
        }
    }

    /// Remove `path`. Real directories are removed recursively; files and
    /// links (including links to directories) are unlinked.
    pub fn delete(path: &Path) -> Result<()> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| SyncError::io(e, "inspecting", path))?;

        if metadata.is_dir() {
            fs::remove_dir_all(path).map_err(|e| SyncError::io(e, "removing directory", path))
        } else {
            fs::remove_file(path).map_err(|e| SyncError::io(e, "removing file", path))
        }
    }

    /// Create a single directory. The parent must already exist.
    pub fn create_dir(path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| SyncError::io(e, "creating directory", path))
    }

    /// Copy file contents from `from` to `to`, replacing `to` if present.
    pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
        fs::copy(from, to).map_err(|e| SyncError::io(e, "copying to", to))
    }
}
