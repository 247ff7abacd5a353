//! Task pipeline engine.
//!
//! A [`Task`] is an immutable description of one external-tool invocation:
//! a name, a structured [`CommandSpec`], and a set of [`SkipMarker`]s whose
//! collective presence means the work was already done. The
//! [`TaskRunner`] applies the skip rule, spawns the command through a
//! [`CommandExecutor`], times it and turns a failing exit into a
//! [`StepError`].
//!
//! # Skip rule
//!
//! A task is skipped iff it declares at least one marker and every marker
//! is present. A task with no markers always runs.

mod command;
mod errors;
mod runner;
mod types;

pub use command::{CommandExecutor, CommandSpec, CommandStatus, SystemExecutor};
pub use errors::{StepError, StepResult};
pub use runner::TaskRunner;
pub use types::{SkipMarker, Task, TaskOutcome};
