//! Drives one run end to end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use serde::Serialize;

use super::errors::{RunError, RunResult};
use super::finalize::relocate_artifacts;
use super::state::RunState;
use crate::config::Settings;
use crate::layout::{
    disambiguated_path, frame_extraction_task, LayoutError, PathResolver, RunLayout,
};
use crate::logging::RunLogger;
use crate::models::RunConfig;
use crate::pipeline::{build_pipeline, Pipeline};
use crate::storage::Storage;
use crate::task::{CommandExecutor, Task, TaskOutcome, TaskRunner};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub layout: RunLayout,
    /// Stages whose command was run, in order (frame extraction included).
    pub executed: Vec<String>,
    /// Stages skipped because their output already existed.
    pub skipped: Vec<String>,
    /// Model files moved into `sparse/0`.
    pub relocated: Vec<String>,
    pub elapsed: Duration,
}

/// What a run would do, computed without touching the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub layout: RunLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_extraction: Option<Task>,
    pub pipeline: Pipeline,
}

/// Compute the layout and stages for `config` with no side effects.
///
/// The layout is the one [`RunOrchestrator::run`] would produce, assuming
/// the folder rename succeeds.
pub fn plan_run(config: &RunConfig, settings: &Settings) -> RunResult<RunPlan> {
    let image_root = validated_image_root(config)?;
    let frame_extraction = config
        .input
        .video
        .as_deref()
        .map(|video| {
            frame_extraction_task(
                video,
                &image_root,
                config.extraction_fps,
                &settings.tools,
                &settings.frames,
            )
        });

    let source = disambiguated_path(&image_root).unwrap_or(image_root);
    let layout = RunLayout::derive(source, config.stride, config.model)?;
    let pipeline = build_pipeline(&layout, config, settings);

    Ok(RunPlan {
        layout,
        frame_extraction,
        pipeline,
    })
}

fn validated_image_root(config: &RunConfig) -> RunResult<PathBuf> {
    config.validate().map_err(RunError::invalid_configuration)?;

    let root = config.input.image_root().ok_or_else(|| {
        RunError::invalid_configuration("Either an image directory or a video file must be supplied")
    })?;
    let root = std::path::absolute(&root)
        .map_err(|e| RunError::from(LayoutError::io(format!("resolving {}", root.display()), e)))?;

    // Frames decode straight into the renamed folder so a rerun finds them.
    if config.input.video.is_some() {
        return Ok(disambiguated_path(&root).unwrap_or(root));
    }
    Ok(root)
}

/// Runs the stages of one reconstruction in order, stopping at the first
/// failure.
pub struct RunOrchestrator {
    storage: Arc<dyn Storage>,
    executor: Arc<dyn CommandExecutor>,
    logger: Arc<RunLogger>,
    settings: Settings,
    state: RunState,
}

impl RunOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        executor: Arc<dyn CommandExecutor>,
        logger: Arc<RunLogger>,
        settings: Settings,
    ) -> Self {
        Self {
            storage,
            executor,
            logger,
            settings,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline for `config`.
    ///
    /// Configuration and layout problems abort before any stage starts. A
    /// failing stage aborts the run; nothing is cleaned up.
    pub fn run(&mut self, config: &RunConfig) -> RunResult<RunReport> {
        let started = Instant::now();
        self.logger.info(&format!(
            "Run started at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ));

        match self.run_inner(config, started) {
            Ok(report) => {
                self.state = RunState::Done;
                self.logger.success(&format!(
                    "Run finished at {}",
                    Local::now().format(TIMESTAMP_FORMAT)
                ));
                self.logger.info(&format!(
                    "Total time taken: {:.2} seconds",
                    report.elapsed.as_secs_f64()
                ));
                self.logger.flush();
                Ok(report)
            }
            Err(e) => {
                self.state = RunState::Failed {
                    reason: e.to_string(),
                };
                self.logger.error(&format!("Run aborted: {}", e));
                self.logger.flush();
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, config: &RunConfig, started: Instant) -> RunResult<RunReport> {
        self.state = RunState::Resolving;
        let image_root = validated_image_root(config)?;
        let runner = TaskRunner::new(
            self.storage.clone(),
            self.executor.clone(),
            self.logger.clone(),
        );

        let mut executed = Vec::new();
        let mut skipped = Vec::new();

        if let Some(video) = config.input.video.as_deref() {
            let task = frame_extraction_task(
                video,
                &image_root,
                config.extraction_fps,
                &self.settings.tools,
                &self.settings.frames,
            );
            self.logger.phase(task.name());
            let outcome = runner
                .execute(&task)
                .map_err(|e| RunError::stage_failed(task.name(), e))?;
            record(&task, outcome, &mut executed, &mut skipped);
        }

        let resolver = PathResolver::new(self.storage.clone(), self.logger.clone());
        let layout = resolver.resolve(&image_root, config)?;
        self.attach_log_file(&layout);

        self.state = RunState::Building;
        let pipeline = build_pipeline(&layout, config, &self.settings);
        self.logger.info(&format!(
            "Planned {} stages: {}",
            pipeline.len(),
            pipeline.names().join(", ")
        ));

        let total = pipeline.len();
        for (i, task) in pipeline.tasks().iter().enumerate() {
            self.state = RunState::Running {
                stage: task.name().to_string(),
                index: i + 1,
                total,
            };
            self.logger.phase(task.name());
            let outcome = runner
                .execute(task)
                .map_err(|e| RunError::stage_failed(task.name(), e))?;
            record(task, outcome, &mut executed, &mut skipped);
        }

        self.state = RunState::Finalizing;
        let relocated = relocate_artifacts(self.storage.as_ref(), &layout)?;
        if !relocated.is_empty() {
            self.logger.info(&format!(
                "Moved {} into {}",
                relocated.join(", "),
                layout.sparse_primary_subdir.display()
            ));
        }

        Ok(RunReport {
            layout,
            executed,
            skipped,
            relocated,
            elapsed: started.elapsed(),
        })
    }

    // Relative names resolve against the work root.
    fn attach_log_file(&self, layout: &RunLayout) {
        let Some(name) = &self.settings.logging.log_file else {
            return;
        };
        let path = layout.work_root.join(name);
        match self.logger.attach_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "run log attached"),
            Err(e) => self
                .logger
                .warn(&format!("Could not open log file {}: {}", path.display(), e)),
        }
    }
}

fn record(task: &Task, outcome: TaskOutcome, executed: &mut Vec<String>, skipped: &mut Vec<String>) {
    match outcome {
        TaskOutcome::Executed { .. } => executed.push(task.name().to_string()),
        TaskOutcome::Skipped(_) => skipped.push(task.name().to_string()),
    }
}
