//! Executes tasks with skip logic, timing, logging and failure propagation.

use std::sync::Arc;
use std::time::Instant;

use super::command::CommandExecutor;
use super::errors::{StepError, StepResult};
use super::types::{Task, TaskOutcome};
use crate::logging::RunLogger;
use crate::storage::Storage;

/// Runs one [`Task`] at a time.
///
/// The runner has no side effects beyond creating a task's prepared
/// directories, spawning its command and logging.
pub struct TaskRunner {
    storage: Arc<dyn Storage>,
    executor: Arc<dyn CommandExecutor>,
    logger: Arc<RunLogger>,
}

impl TaskRunner {
    pub fn new(
        storage: Arc<dyn Storage>,
        executor: Arc<dyn CommandExecutor>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            storage,
            executor,
            logger,
        }
    }

    /// Whether `task` would be skipped right now.
    pub fn should_skip(&self, task: &Task) -> bool {
        task.should_skip(self.storage.as_ref())
    }

    /// Execute `task`, or skip it when all of its markers exist.
    ///
    /// A failing command is logged and returned as an error; the caller
    /// must not continue with later tasks.
    pub fn execute(&self, task: &Task) -> StepResult<TaskOutcome> {
        let name = task.name();

        if self.should_skip(task) {
            let markers: Vec<String> = task.skip_markers().iter().map(|m| m.to_string()).collect();
            let reason = format!("output already exists ({})", markers.join(", "));
            self.logger
                .skipped(&format!("Skipping task '{}' - {}", name, reason));
            return Ok(TaskOutcome::Skipped(reason));
        }

        for dir in task.prepare_dirs() {
            self.storage.create_dir_all(dir).map_err(|e| {
                let err = StepError::io_error(format!("creating {}", dir.display()), e);
                self.logger
                    .error(&format!("Task '{}' failed with error: {}", name, err));
                err
            })?;
        }

        let started = Instant::now();
        self.logger.info(&format!("Running task '{}'...", name));
        self.logger.command(&task.command().render());

        let tool = task.command().program();
        let status = self.executor.run(task.command()).map_err(|e| {
            let err = StepError::spawn_failed(tool, e);
            self.logger
                .error(&format!("Task '{}' failed with error: {}", name, err));
            err
        })?;

        if !status.success() {
            let err = StepError::command_failed(tool, status.code.unwrap_or(-1), status.describe());
            self.logger
                .error(&format!("Task '{}' failed with error: {}", name, err));
            return Err(err);
        }

        let elapsed = started.elapsed();
        self.logger.info(&format!(
            "Time taken for task '{}': {:.2} seconds",
            name,
            elapsed.as_secs_f64()
        ));
        tracing::debug!(task = name, elapsed_ms = elapsed.as_millis() as u64, "task finished");

        Ok(TaskOutcome::Executed { elapsed })
    }
}
