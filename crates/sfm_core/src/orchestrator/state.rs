//! Run state machine.

use std::fmt;

/// Where a run currently is.
///
/// `NotStarted → Resolving → Building → Running → Finalizing → Done`;
/// any failure moves to `Failed`, which is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    /// Validating input, extracting frames, resolving the layout.
    Resolving,
    Building,
    /// Executing stage `index` (1-based) of `total`.
    Running {
        stage: String,
        index: usize,
        total: usize,
    },
    /// Relocating the reconstruction into `sparse/0`.
    Finalizing,
    Done,
    Failed {
        reason: String,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not started"),
            RunState::Resolving => write!(f, "resolving"),
            RunState::Building => write!(f, "building"),
            RunState::Running {
                stage,
                index,
                total,
            } => write!(f, "running {} ({}/{})", stage, index, total),
            RunState::Finalizing => write!(f, "finalizing"),
            RunState::Done => write!(f, "done"),
            RunState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
