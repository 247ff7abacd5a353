//! Errors raised while resolving the run layout.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration-class failures: the run aborts before any stage executes.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Cannot use {path} as a source directory: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    #[error("Cannot rename {from} to {to}: destination already exists")]
    RenameCollision { from: PathBuf, to: PathBuf },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl LayoutError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn invalid_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
