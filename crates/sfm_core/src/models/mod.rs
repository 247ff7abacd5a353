//! Data models shared by the resolver, builder and orchestrator.
//!
//! - Enums for matcher, model and mapper choices
//! - Per-run configuration (input source, stride, training parameters)

mod enums;
mod run;

pub use enums::{MapperBackend, MatcherKind, ModelKind, ParseKindError};
pub use run::{InputSource, RunConfig, TrainingParams, DEFAULT_FRAMES_DIR};
