// Centralized error handling module
// Every filesystem failure carries the operation and path it happened on

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for mirroring operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source root does not exist
    #[error("source folder not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Source root exists but cannot be listed
    #[error("source folder is not readable: {}: {source}", path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    /// Source root exists but is not a directory
    #[error("source path is not a directory: {}", path.display())]
    SourceNotDirectory { path: PathBuf },

    /// Replica root exists but is not a directory
    #[error("replica path is not a directory: {}", path.display())]
    ReplicaNotDirectory { path: PathBuf },

    /// Replica root could not be created
    #[error("failed to create replica folder {}: {source}", path.display())]
    ReplicaCreate { path: PathBuf, source: io::Error },

    /// Permission problems get their own variant so the message is actionable
    #[error("permission denied while {operation} {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        operation: String,
        source: io::Error,
    },

    /// Any other I/O failure during a pass
    #[error("I/O error while {operation} {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        source: io::Error,
    },

    #[error("unsupported digest algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SyncError {
    /// Wrap an io::Error with the operation and path it failed on
    pub fn io(err: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::PermissionDenied => SyncError::PermissionDenied {
                path,
                operation: operation.to_string(),
                source: err,
            },
            _ => SyncError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Errors raised before any pass runs
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            SyncError::SourceMissing { .. }
                | SyncError::SourceUnreadable { .. }
                | SyncError::SourceNotDirectory { .. }
                | SyncError::ReplicaNotDirectory { .. }
                | SyncError::ReplicaCreate { .. }
        )
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
