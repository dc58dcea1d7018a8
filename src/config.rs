//! Command line and configuration file handling.
//!
//! Precedence: command line, then the optional TOML file, then defaults.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::sync::driver::ErrorPolicy;
use crate::sync::hash::DigestAlgorithm;

/// Largest accepted polling interval in seconds.
pub const MAX_POLL_INTERVAL: u64 = 60;

/// Largest accepted verbosity level.
pub const MAX_VERBOSITY: u8 = 5;

/// One-way folder synchronization
#[derive(Debug, Default, Parser)]
#[command(name = "mirrorsync", version, about)]
pub struct Cli {
    /// Path to the source folder [default: source_folder]
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Path to the replica folder [default: replica_folder]
    #[arg(short, long)]
    pub replica: Option<PathBuf>,

    /// Synchronization poll interval in seconds, 0 runs once [default: 0]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(0..=60))]
    pub poll: Option<u64>,

    /// Path to the log file [default: mirrorsync.log]
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Verbosity (0 = NOTSET, 1 = DEBUG, 2 = INFO, 3 = WARNING, 4 = ERROR, 5 = CRITICAL) [default: 3]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub verbose: Option<u8>,

    /// Digest used to detect changed files (md5, blake3) [default: md5]
    #[arg(long)]
    pub digest: Option<DigestAlgorithm>,

    /// Keep polling after a failed pass instead of exiting
    #[arg(long)]
    pub keep_going: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Contents of a configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub poll_interval: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub verbosity: Option<u8>,
    pub digest: Option<DigestAlgorithm>,
    pub error_policy: Option<ErrorPolicy>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SyncError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// Seconds between passes; 0 runs a single pass.
    pub poll_interval: u64,
    pub log_file: PathBuf,
    pub verbosity: u8,
    pub digest: DigestAlgorithm,
    pub error_policy: ErrorPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("source_folder"),
            replica: PathBuf::from("replica_folder"),
            poll_interval: 0,
            log_file: PathBuf::from("mirrorsync.log"),
            verbosity: 3,
            digest: DigestAlgorithm::Md5,
            error_policy: ErrorPolicy::Abort,
        }
    }
}

impl SyncConfig {
    /// Merge the command line over the config file (if any) over defaults.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = &cli.config {
            config.apply_file(FileConfig::load(path)?);
        }
        config.apply_cli(cli);
        config.validate()?;

        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(source) = file.source {
            self.source = source;
        }
        if let Some(replica) = file.replica {
            self.replica = replica;
        }
        if let Some(poll_interval) = file.poll_interval {
            self.poll_interval = poll_interval;
        }
        if let Some(log_file) = file.log_file {
            self.log_file = log_file;
        }
        if let Some(verbosity) = file.verbosity {
            self.verbosity = verbosity;
        }
        if let Some(digest) = file.digest {
            self.digest = digest;
        }
        if let Some(error_policy) = file.error_policy {
            self.error_policy = error_policy;
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(source) = &cli.source {
            self.source = source.clone();
        }
        if let Some(replica) = &cli.replica {
            self.replica = replica.clone();
        }
        if let Some(poll) = cli.poll {
            self.poll_interval = poll;
        }
        if let Some(log) = &cli.log {
            self.log_file = log.clone();
        }
        if let Some(verbose) = cli.verbose {
            self.verbosity = verbose;
        }
        if let Some(digest) = cli.digest {
            self.digest = digest;
        }
        if cli.keep_going {
            self.error_policy = ErrorPolicy::Continue;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(SyncError::InvalidConfig {
                message: format!(
                    "poll interval {} exceeds the maximum of {} seconds",
                    self.poll_interval, MAX_POLL_INTERVAL
                ),
            });
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(SyncError::InvalidConfig {
                message: format!(
                    "verbosity {} is outside 0..={}",
                    self.verbosity, MAX_VERBOSITY
                ),
            });
        }
        Ok(())
    }
}
