//! Error types for a pipeline run.
//!
//! Errors carry context that chains through layers:
//! Run → Stage → Operation → Detail

use std::io;

use thiserror::Error;

use crate::layout::LayoutError;
use crate::task::StepError;

/// Top-level run error.
#[derive(Error, Debug)]
pub enum RunError {
    /// Configuration was rejected before anything touched the filesystem.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The directory layout could not be resolved.
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),

    /// A stage failed; later stages were not run.
    #[error("Stage '{stage_name}' failed: {source}")]
    StageFailed {
        stage_name: String,
        #[source]
        source: StepError,
    },

    /// Moving reconstruction artifacts into place failed.
    #[error("Finalization failed while {operation}: {source}")]
    FinalizeFailed {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn stage_failed(stage_name: impl Into<String>, source: StepError) -> Self {
        Self::StageFailed {
            stage_name: stage_name.into(),
            source,
        }
    }

    pub fn finalize_failed(operation: impl Into<String>, source: io::Error) -> Self {
        Self::FinalizeFailed {
            operation: operation.into(),
            source,
        }
    }

    /// Raised before any stage ran (bad flags, unusable source folder).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. } | Self::Layout(_))
    }

    /// Name of the failing stage, if a stage failed.
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage_name, .. } => Some(stage_name.as_str()),
            _ => None,
        }
    }
}

/// Result type for run operations.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::path::PathBuf;

    #[test]
    fn stage_failure_chains_to_tool_error() {
        let err = RunError::stage_failed(
            "Mapping",
            StepError::command_failed("glomap", 3, "exit code 3"),
        );

        assert_eq!(err.stage_name(), Some("Mapping"));
        assert!(!err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("Mapping"));
        assert!(msg.contains("glomap"));
        assert!(err.source().is_some());
    }

    #[test]
    fn layout_errors_are_configuration_errors() {
        let err: RunError = LayoutError::SourceNotFound(PathBuf::from("/missing")).into();
        assert!(err.is_configuration());
        assert_eq!(err.stage_name(), None);
    }
}
