//! Error types for modwatch
//!
//! This module provides the error handling for the library:
//! - A single crate-wide [`Error`] enum with contextual fields per variant
//! - A [`Result`] alias used throughout
//! - A stable, machine-readable kind string per variant ([`Error::kind`]),
//!   used for sidecar failure logs and log filtering

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for modwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modwatch
///
/// Each variant includes contextual information to help diagnose issues.
/// Errors raised during the install stage are caught at the per-file handler
/// boundary and converted into a failure outcome; they never terminate the
/// watch loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "staging_dir")
        key: Option<String>,
    },

    /// A file's size never settled within the stability timeout
    #[error("timed out waiting for download to finish: {} (waited {waited:?})", .path.display())]
    StabilityTimeout {
        /// The file being probed
        path: PathBuf,
        /// Total time spent probing before giving up
        waited: Duration,
    },

    /// The file disappeared while its size was being probed
    #[error("file vanished during stability check: {}", .path.display())]
    FileVanished {
        /// The file that disappeared
        path: PathBuf,
    },

    /// An archive entry resolves outside the extraction root (zip-slip)
    #[error("unsafe path in archive {}: {entry}", .archive.display())]
    UnsafeArchive {
        /// The offending archive
        archive: PathBuf,
        /// The entry name that escapes the extraction root
        entry: String,
    },

    /// The archive could not be read or parsed
    #[error("corrupt archive {}: {reason}", .archive.display())]
    CorruptArchive {
        /// The unreadable archive
        archive: PathBuf,
        /// What went wrong while reading it
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Folder watching error
    #[error("folder watch error: {0}")]
    Watch(String),
}

impl Error {
    /// Stable, machine-readable kind string for this error
    ///
    /// Written into sidecar failure logs so that the bucket contents remain
    /// greppable regardless of message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config",
            Error::StabilityTimeout { .. } => "stability-timeout",
            Error::FileVanished { .. } => "file-vanished",
            Error::UnsafeArchive { .. } => "unsafe-archive",
            Error::CorruptArchive { .. } => "corrupt-archive",
            Error::Io(_) => "io-error",
            Error::Serialization(_) => "serialization",
            Error::Watch(_) => "watch",
        }
    }
}
