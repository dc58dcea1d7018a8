use std::ffi::OsString;

/// What a directory entry is.
///
/// Source entries are classified after following symbolic links, so they are
/// always `File` or `Directory`. Replica entries are classified without
/// following links, and anything that is not a regular file or a real
/// directory is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic links and special files on the replica side.
    Other,
}

/// One immediate child of a directory: a single path segment plus its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
