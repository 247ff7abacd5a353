//! Per-run configuration assembled from CLI flags and settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::{MatcherKind, ModelKind};

/// Folder name frames are decoded into when only a video is supplied.
pub const DEFAULT_FRAMES_DIR: &str = "source";

/// Where the input images come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSource {
    /// Directory of source images.
    pub image_dir: Option<PathBuf>,
    /// Video to sample frames from before reconstruction.
    pub video: Option<PathBuf>,
}

impl InputSource {
    /// Input backed by an existing image directory.
    pub fn images(dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: Some(dir.into()),
            video: None,
        }
    }

    /// Input decoded from a video into `<video parent>/source`.
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: None,
            video: Some(path.into()),
        }
    }

    /// Directory the images are read from (and frames are decoded into).
    ///
    /// Returns `None` when neither an image directory nor a video is set.
    pub fn image_root(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.image_dir {
            return Some(dir.clone());
        }
        self.video.as_deref().map(frames_dir_for)
    }
}

fn frames_dir_for(video: &Path) -> PathBuf {
    video
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_FRAMES_DIR)
}

/// Training stage parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Total optimisation steps.
    pub steps: u32,
    /// Export a snapshot every this many steps.
    pub export_every: u32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            steps: 30_000,
            export_every: 7_000,
        }
    }
}

/// Everything one invocation of the pipeline needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: InputSource,
    pub matcher: MatcherKind,
    /// Keep every `stride`-th image; 1 keeps all of them.
    pub stride: usize,
    pub model: ModelKind,
    pub training: TrainingParams,
    /// Frames per second sampled from a video input.
    pub extraction_fps: f64,
}

impl RunConfig {
    pub fn new(input: InputSource) -> Self {
        Self {
            input,
            matcher: MatcherKind::default(),
            stride: 1,
            model: ModelKind::default(),
            training: TrainingParams::default(),
            extraction_fps: 2.0,
        }
    }

    pub fn with_matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_training(mut self, training: TrainingParams) -> Self {
        self.training = training;
        self
    }

    pub fn with_extraction_fps(mut self, fps: f64) -> Self {
        self.extraction_fps = fps;
        self
    }

    /// Check the configuration before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), String> {
        if self.input.image_dir.is_none() && self.input.video.is_none() {
            return Err("Either an image directory or a video file must be supplied".to_string());
        }
        if self.stride == 0 {
            return Err("Interval must be at least 1".to_string());
        }
        if self.input.video.is_some()
            && !(self.extraction_fps.is_finite() && self.extraction_fps > 0.0)
        {
            return Err(format!(
                "Frame extraction rate must be a positive number, got {}",
                self.extraction_fps
            ));
        }
        if self.model.is_trainable() {
            if self.training.steps == 0 {
                return Err("Training step count must be at least 1".to_string());
            }
            if self.training.export_every == 0 {
                return Err("Export cadence must be at least 1".to_string());
            }
        }
        Ok(())
    }
}
