//! Pipeline construction.
//!
//! The stage order is an explicit value built by [`build_pipeline`]:
//!
//! ```text
//! Pipeline
//!     ├── Feature Extraction   (skip: distorted/database.db)
//!     ├── Feature Matching     (never skipped)
//!     ├── Mapping              (skip: sparse/0)
//!     ├── Image Undistortion   (3dgs; skip: images/ and sparse/frames.bin)
//!     └── Training             (3dgs; skip: output/*.ply)
//! ```

mod builder;

use serde::Serialize;

use crate::task::Task;

pub use builder::{
    build_pipeline, EXPORT_EXTENSION, FEATURE_EXTRACTION, FEATURE_MATCHING, IMAGE_UNDISTORTION,
    MAPPING, TRAINING, UNDISTORTION_MARKER_FILE,
};

/// Ordered, immutable list of tasks for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Pipeline {
    tasks: Vec<Task>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task (builder pattern).
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CommandSpec;

    #[test]
    fn pipeline_builds_in_order() {
        let pipeline = Pipeline::new()
            .with_task(Task::new("Step1", CommandSpec::new("true")))
            .with_task(Task::new("Step2", CommandSpec::new("true")));

        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
        assert_eq!(pipeline.names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn pipeline_serializes_commands() {
        let pipeline = Pipeline::new().with_task(Task::new(
            "Mapping",
            CommandSpec::new("glomap").arg("mapper"),
        ));

        let json = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(json["tasks"][0]["name"], "Mapping");
        assert_eq!(json["tasks"][0]["command"]["program"], "glomap");
    }
}
