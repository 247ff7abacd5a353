//! sfm-run - runs a structure-from-motion toolchain over a folder of images
//! or a video.
//!
//! Usage:
//!   sfm-run --image-path ./scan/photos --interval 2 --model-type nerfstudio
//!   sfm-run --video-path ./walk.mp4 --fps 3 --iterations 7000
//!   sfm-run --image-path ./scan/photos --dry-run

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use directories::ProjectDirs;

use sfm_core::config::{ConfigManager, Settings};
use sfm_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use sfm_core::models::{InputSource, MatcherKind, ModelKind, RunConfig, TrainingParams};
use sfm_core::storage::FsStorage;
use sfm_core::task::SystemExecutor;
use sfm_core::{plan_run, RunOrchestrator};

const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Parser, Debug)]
#[command(
    name = "sfm-run",
    version,
    about = "Run feature extraction, matching, mapping and splat training over a scan",
    long_about = None
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["image_path", "video_path"])
))]
struct Cli {
    /// Folder of source images (frames are written here when a video is given too)
    #[arg(long, alias = "image_path", value_name = "DIR")]
    image_path: Option<PathBuf>,

    /// Video to sample frames from
    #[arg(long, alias = "video_path", value_name = "FILE")]
    video_path: Option<PathBuf>,

    /// sequential_matcher or exhaustive_matcher
    #[arg(long, alias = "matcher_type", value_name = "KIND")]
    matcher_type: Option<MatcherKind>,

    /// Use every N-th image
    #[arg(long, value_name = "N")]
    interval: Option<usize>,

    /// 3dgs (reconstruct and train) or nerfstudio (reconstruct only)
    #[arg(long, alias = "model_type", value_name = "KIND")]
    model_type: Option<ModelKind>,

    /// Training steps
    #[arg(long, value_name = "N")]
    iterations: Option<u32>,

    /// Export a snapshot every N training steps
    #[arg(long, alias = "save_every", value_name = "N")]
    save_every: Option<u32>,

    /// Frames per second to sample from the video
    #[arg(long, value_name = "FPS")]
    fps: Option<f64>,

    /// Settings file (defaults to the per-user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the planned layout and commands as JSON and exit
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// Merge flags over the values from the settings file.
    fn run_config(&self, settings: &Settings) -> RunConfig {
        let recon = &settings.reconstruction;
        let defaults = settings.training.params();

        RunConfig::new(InputSource {
            image_dir: self.image_path.clone(),
            video: self.video_path.clone(),
        })
        .with_matcher(self.matcher_type.unwrap_or(recon.matcher))
        .with_stride(self.interval.unwrap_or(recon.interval))
        .with_model(self.model_type.unwrap_or(recon.model))
        .with_training(TrainingParams {
            steps: self.iterations.unwrap_or(defaults.steps),
            export_every: self.save_every.unwrap_or(defaults.export_every),
        })
        .with_extraction_fps(self.fps.unwrap_or(settings.frames.fps))
    }

    fn log_level(&self, settings: &Settings) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            settings.logging.level
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let level = cli.log_level(&settings);
    init_tracing(level);

    let config = cli.run_config(&settings);
    tracing::debug!(?config, "run configuration");

    if cli.dry_run {
        let plan = plan_run(&config, &settings)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let logger = Arc::new(RunLogger::console(LogConfig {
        level,
        show_timestamps: settings.logging.show_timestamps,
    }));
    let mut orchestrator = RunOrchestrator::new(
        Arc::new(FsStorage::new()),
        Arc::new(SystemExecutor),
        logger,
        settings,
    );

    let report = orchestrator.run(&config)?;
    tracing::info!(
        executed = report.executed.len(),
        skipped = report.skipped.len(),
        work_root = %report.layout.work_root.display(),
        "run complete"
    );
    Ok(())
}

fn settings_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let dirs = ProjectDirs::from("", "", "sfm-run")
        .context("Could not determine a configuration directory")?;
    Ok(dirs.config_dir().join(SETTINGS_FILE_NAME))
}

/// An explicit `--config` must exist; the default file is created on first use.
fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let path = settings_path(explicit)?;
    let mut manager = ConfigManager::new(path);

    let loaded = if explicit.is_some() {
        manager.load()
    } else {
        manager.load_or_create()
    };
    loaded.with_context(|| format!("Failed to load settings from {}", manager.path().display()))?;

    Ok(manager.into_settings())
}
