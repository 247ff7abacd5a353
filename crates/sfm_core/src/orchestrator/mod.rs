//! Run orchestration.
//!
//! # Architecture
//!
//! ```text
//! RunOrchestrator::run(config)
//!     ├── validate RunConfig
//!     ├── Frame Extraction (video input only)
//!     ├── PathResolver::resolve      → RunLayout
//!     ├── build_pipeline             → Pipeline
//!     ├── TaskRunner::execute        (each task, stop on first error)
//!     └── relocate_artifacts         (sparse/*.bin → sparse/0)
//! ```
//!
//! Progress is observable through [`RunOrchestrator::state`]. Errors chain
//! Run → Stage → Operation, see [`RunError`].

mod errors;
mod finalize;
mod run;
mod state;

pub use errors::{RunError, RunResult};
pub use finalize::{relocate_artifacts, SPARSE_ARTIFACTS};
pub use run::{plan_run, RunOrchestrator, RunPlan, RunReport};
pub use state::RunState;
