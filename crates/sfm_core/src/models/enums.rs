//! Core enums used throughout the pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a kind name on the command line or in a config
/// file does not match any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {what} '{value}' (expected one of: {expected})")]
pub struct ParseKindError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseKindError {
    fn new(what: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            what,
            value: value.to_string(),
            expected,
        }
    }
}

/// Feature matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// Match each image against its neighbours in capture order.
    #[default]
    Sequential,
    /// Match every image pair.
    Exhaustive,
}

impl MatcherKind {
    /// The colmap subcommand implementing this matcher.
    pub fn subcommand(&self) -> &'static str {
        match self {
            MatcherKind::Sequential => "sequential_matcher",
            MatcherKind::Exhaustive => "exhaustive_matcher",
        }
    }
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subcommand())
    }
}

impl FromStr for MatcherKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential_matcher" | "sequential" => Ok(MatcherKind::Sequential),
            "exhaustive_matcher" | "exhaustive" => Ok(MatcherKind::Exhaustive),
            other => Err(ParseKindError::new(
                "matcher type",
                other,
                "sequential_matcher, exhaustive_matcher",
            )),
        }
    }
}

/// Which downstream model the reconstruction is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// Gaussian splatting: undistort the images, then train.
    #[default]
    #[serde(rename = "3dgs")]
    Trainable,
    /// Sparse reconstruction only (nerfstudio consumes distorted images).
    #[serde(rename = "nerfstudio")]
    ReconstructionOnly,
}

impl ModelKind {
    /// Whether the undistortion and training stages belong in the pipeline.
    pub fn is_trainable(&self) -> bool {
        matches!(self, ModelKind::Trainable)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Trainable => write!(f, "3dgs"),
            ModelKind::ReconstructionOnly => write!(f, "nerfstudio"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3dgs" => Ok(ModelKind::Trainable),
            "nerfstudio" => Ok(ModelKind::ReconstructionOnly),
            other => Err(ParseKindError::new("model type", other, "3dgs, nerfstudio")),
        }
    }
}

/// Program used for the sparse mapping stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapperBackend {
    /// Global structure-from-motion (`glomap mapper`).
    #[default]
    Glomap,
    /// Incremental structure-from-motion (`colmap mapper`).
    Colmap,
}

impl std::fmt::Display for MapperBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapperBackend::Glomap => write!(f, "glomap"),
            MapperBackend::Colmap => write!(f, "colmap"),
        }
    }
}
