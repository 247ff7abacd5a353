//! Errors raised while running a single task.

use std::io;

use thiserror::Error;

/// Error from one pipeline task, carrying the tool and operation involved.
#[derive(Error, Debug)]
pub enum StepError {
    /// The external tool ran and reported failure.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The external tool could not be started at all.
    #[error("Failed to start {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// File I/O error while preparing the task.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn spawn_failed(tool: impl Into<String>, source: io::Error) -> Self {
        Self::SpawnFailed {
            tool: tool.into(),
            source,
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for task operations.
pub type StepResult<T> = Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_names_tool_and_code() {
        let err = StepError::command_failed("colmap", 1, "exited with status 1");
        let msg = err.to_string();
        assert!(msg.contains("colmap"));
        assert!(msg.contains("exit code 1"));
    }

    #[test]
    fn spawn_failure_keeps_source() {
        let err = StepError::spawn_failed(
            "glomap",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("glomap"));
    }
}
