//! sfm_core - task pipeline engine for photogrammetry toolchains.
//!
//! Runs a fixed sequence of external reconstruction tools (feature
//! extraction, matching, mapping and, for trainable models, undistortion
//! and training) over one image folder. Stages whose outputs already exist
//! are skipped, so an interrupted run can be restarted cheaply.
//!
//! This crate has no CLI dependencies; `sfm_cli` is the command line front
//! end.

pub mod config;
pub mod layout;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod storage;
pub mod task;

pub use orchestrator::{plan_run, RunError, RunOrchestrator, RunPlan, RunReport, RunState};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
