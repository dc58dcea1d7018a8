//! Content digests used to decide whether a replica file is stale.
//!
//! Digests are recomputed on every pass; nothing is cached between passes.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::{Digest as Md5Digest, Md5};
use serde::Deserialize;

use crate::error::{Result, SyncError};

/// Streaming read buffer (1MB)
const BUFFER_SIZE: usize = 1024 * 1024;

/// Digest algorithm used for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// 128-bit MD5 (default).
    #[default]
    Md5,
    /// 256-bit BLAKE3.
    Blake3,
}

impl DigestAlgorithm {
    /// Fresh streaming hasher for this algorithm.
    pub fn hasher(self) -> Box<dyn Hasher> {
        match self {
            DigestAlgorithm::Md5 => Box::new(Md5Wrapper(Md5::new())),
            DigestAlgorithm::Blake3 => Box::new(Blake3Wrapper(blake3::Hasher::new())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            _ => Err(SyncError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the result
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Md5Digest::finalize(self.0).to_vec()
    }
}

struct Blake3Wrapper(blake3::Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

/// A computed file digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// The algorithm used.
    pub algorithm: DigestAlgorithm,
    /// Raw digest bytes.
    pub bytes: Vec<u8>,
}

impl FileDigest {
    /// Hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Hash in-memory bytes.
pub fn hash_bytes(data: &[u8], algorithm: DigestAlgorithm) -> FileDigest {
    let mut hasher = algorithm.hasher();
    hasher.update(data);
    FileDigest {
        algorithm,
        bytes: hasher.finalize(),
    }
}

/// Hash a file with a buffered streaming read.
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> Result<FileDigest> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    hash_file_with(path, algorithm, &mut buffer)
}

/// Hash a file, reading through a caller-owned buffer.
fn hash_file_with(
    path: &Path,
    algorithm: DigestAlgorithm,
    buffer: &mut [u8],
) -> Result<FileDigest> {
    let mut file = File::open(path).map_err(|e| SyncError::io(e, "opening for hashing", path))?;
    let mut hasher = algorithm.hasher();

    loop {
        let bytes_read = file
            .read(buffer)
            .map_err(|e| SyncError::io(e, "hashing", path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(FileDigest {
        algorithm,
        bytes: hasher.finalize(),
    })
}

/// Whether two files have identical content according to `algorithm`.
pub fn same_content(a: &Path, b: &Path, algorithm: DigestAlgorithm) -> Result<bool> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let first = hash_file_with(a, algorithm, &mut buffer)?;
    let second = hash_file_with(b, algorithm, &mut buffer)?;
    Ok(first == second)
}
