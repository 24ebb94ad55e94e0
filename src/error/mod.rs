//! # Error Module
//!
//! Error types for the duplicate finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Local failures stay local** - a file that cannot be read is skipped,
//!   the scan carries on
//!
//! Cancellation is not an error. It is reported as
//! [`ScanOutcome::Cancelled`](crate::core::pipeline::ScanOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum DuplicateFinderError {
    /// From [`FileEntry::probe`](crate::core::scanner::FileEntry::probe) when
    /// called directly. The pipeline records these as skips instead.
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    /// From [`DifferenceHasher::hash_file`](crate::core::hasher::DifferenceHasher::hash_file)
    /// when called directly.
    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while probing candidate files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a regular file: {path}")]
    NotAFile { path: PathBuf },
}

/// Errors that occur while hashing file content or image pixels
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Resize failed: {0}")]
    ResizeFailed(String),
}

impl HashError {
    /// Attach a path to errors that were raised without one.
    pub fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            HashError::ResizeFailed(reason) => HashError::DecodeError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        }
    }

    /// The file the error concerns, when known
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            HashError::IoError { path, .. }
            | HashError::DecodeError { path, .. }
            | HashError::EmptyImage { path } => Some(path.as_path()),
            HashError::ResizeFailed(_) => None,
        }
    }
}

/// Errors raised when configuring the comparison stage
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Invalid threshold: {value} (must be 0-64)")]
    InvalidThreshold { value: u32 },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DuplicateFinderError>;
