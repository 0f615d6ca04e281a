//! Error type shared by the resolver and the archive builder.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures that abort a package build.
///
/// Per-asset problems (malformed sidecars, vanished content) are logged and skipped by the
/// resolver and builder instead of surfacing here.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The input directory does not exist or is not a directory.
    #[error("input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),
    /// Walking the input tree failed.
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        /// Entry that could not be read.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },
    /// Reading or writing a specific file failed.
    #[error("I/O error on {}: {source}", path.display())]
    File {
        /// File that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing to the archive stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The project configuration could not be loaded.
    #[error("failed to load config {}: {reason}", path.display())]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Human readable cause.
        reason: String,
    },
}

impl PackageError {
    /// Process exit code reported by the command line tool for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound(_) => 1,
            _ => 2,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PackageError>;
