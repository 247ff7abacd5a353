//! Settings struct with TOML-based sections.
//!
//! Every field has a default, so a partial (or empty) settings file is
//! always valid.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{MapperBackend, MatcherKind, ModelKind, TrainingParams};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// External program names or paths.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Reconstruction defaults.
    #[serde(default)]
    pub reconstruction: ReconstructionSettings,

    /// Video frame extraction.
    #[serde(default)]
    pub frames: FrameSettings,

    /// Training stage defaults.
    #[serde(default)]
    pub training: TrainingSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logical sections of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tools,
    Reconstruction,
    Frames,
    Training,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Tools,
        ConfigSection::Reconstruction,
        ConfigSection::Frames,
        ConfigSection::Training,
        ConfigSection::Logging,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "tools",
            ConfigSection::Reconstruction => "reconstruction",
            ConfigSection::Frames => "frames",
            ConfigSection::Training => "training",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the table.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "External programs (name on PATH or absolute path)",
            ConfigSection::Reconstruction => "Sparse reconstruction defaults",
            ConfigSection::Frames => "Frame extraction from video input",
            ConfigSection::Training => "Model training defaults",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

/// External programs invoked by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_colmap")]
    pub colmap: String,

    #[serde(default = "default_glomap")]
    pub glomap: String,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Training program; receives the run root, step count, export
    /// cadence and an output path.
    #[serde(default = "default_trainer")]
    pub trainer: String,
}

fn default_colmap() -> String {
    "colmap".to_string()
}

fn default_glomap() -> String {
    "glomap".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_trainer() -> String {
    "opensplat".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            colmap: default_colmap(),
            glomap: default_glomap(),
            ffmpeg: default_ffmpeg(),
            trainer: default_trainer(),
        }
    }
}

/// Reconstruction defaults, overridable per run from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionSettings {
    /// Matcher used when none is given on the command line.
    #[serde(default)]
    pub matcher: MatcherKind,

    /// Model type used when none is given on the command line.
    #[serde(default)]
    pub model: ModelKind,

    /// Image interval used when none is given on the command line.
    #[serde(default = "default_interval")]
    pub interval: usize,

    /// Camera model passed to the feature extractor.
    #[serde(default = "default_camera_model")]
    pub camera_model: String,

    /// Assume every image was taken by the same camera.
    #[serde(default = "default_true")]
    pub single_camera: bool,

    /// Program used for sparse mapping.
    #[serde(default)]
    pub mapper: MapperBackend,
}

fn default_interval() -> usize {
    1
}

fn default_camera_model() -> String {
    "PINHOLE".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReconstructionSettings {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::default(),
            model: ModelKind::default(),
            interval: default_interval(),
            camera_model: default_camera_model(),
            single_camera: true,
            mapper: MapperBackend::default(),
        }
    }
}

/// Frame extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSettings {
    /// Frames sampled per second of video.
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// JPEG quality scale handed to the decoder (1 = best).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u32,
}

fn default_fps() -> f64 {
    2.0
}

fn default_jpeg_quality() -> u32 {
    1
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Training defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_steps")]
    pub steps: u32,

    #[serde(default = "default_export_every")]
    pub export_every: u32,
}

fn default_steps() -> u32 {
    TrainingParams::default().steps
}

fn default_export_every() -> u32 {
    TrainingParams::default().export_every
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            export_every: default_export_every(),
        }
    }
}

impl TrainingSettings {
    pub fn params(&self) -> TrainingParams {
        TrainingParams {
            steps: self.steps,
            export_every: self.export_every,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for the run log.
    #[serde(default)]
    pub level: LogLevel,

    /// Prefix run log lines with the time of day.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Also append the run log to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            show_timestamps: true,
            log_file: None,
        }
    }
}
