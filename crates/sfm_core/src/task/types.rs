//! Task and skip-marker definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::command::CommandSpec;
use crate::storage::Storage;

/// A filesystem condition standing in for "this stage's output exists".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMarker {
    /// Present when the path exists (file or directory).
    Path(PathBuf),
    /// Present when `dir` directly contains a regular file whose extension
    /// equals `extension` (case-sensitive, without the dot).
    AnyWithExtension { dir: PathBuf, extension: String },
}

impl SkipMarker {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SkipMarker::Path(path.into())
    }

    pub fn any_with_extension(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        SkipMarker::AnyWithExtension {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Check the marker against the filesystem.
    pub fn is_present(&self, storage: &dyn Storage) -> bool {
        match self {
            SkipMarker::Path(path) => storage.exists(path),
            SkipMarker::AnyWithExtension { dir, extension } => {
                if !storage.is_dir(dir) {
                    return false;
                }
                storage
                    .list_files(dir)
                    .map(|files| {
                        files.iter().any(|f| {
                            f.extension().is_some_and(|ext| ext == extension.as_str())
                        })
                    })
                    .unwrap_or(false)
            }
        }
    }
}

impl std::fmt::Display for SkipMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipMarker::Path(path) => write!(f, "{}", path.display()),
            SkipMarker::AnyWithExtension { dir, extension } => {
                write!(f, "{}/*.{}", dir.display(), extension)
            }
        }
    }
}

/// One external-tool invocation treated as an atomic, skippable unit.
///
/// Built once by the pipeline builder and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    name: String,
    command: CommandSpec,
    skip_markers: Vec<SkipMarker>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    prepare_dirs: Vec<PathBuf>,
}

impl Task {
    pub fn new(name: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            command,
            skip_markers: Vec::new(),
            prepare_dirs: Vec::new(),
        }
    }

    pub fn with_skip_marker(mut self, marker: SkipMarker) -> Self {
        self.skip_markers.push(marker);
        self
    }

    /// Directory to create right before the command runs (not when skipped).
    pub fn with_prepared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prepare_dirs.push(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn skip_markers(&self) -> &[SkipMarker] {
        &self.skip_markers
    }

    pub fn prepare_dirs(&self) -> &[PathBuf] {
        &self.prepare_dirs
    }

    /// True iff at least one marker is declared and all of them are present.
    pub fn should_skip(&self, storage: &dyn Storage) -> bool {
        !self.skip_markers.is_empty() && self.skip_markers.iter().all(|m| m.is_present(storage))
    }
}

/// What the runner did with a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The command ran and exited successfully.
    Executed { elapsed: Duration },
    /// Every skip marker was present; nothing was spawned.
    Skipped(String),
}

impl TaskOutcome {
    pub fn was_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn task_with(markers: Vec<SkipMarker>) -> Task {
        markers
            .into_iter()
            .fold(Task::new("Probe", CommandSpec::new("true")), |t, m| {
                t.with_skip_marker(m)
            })
    }

    #[test]
    fn no_markers_never_skips() {
        let storage = MemoryStorage::new();
        storage.add_file("/scan/distorted/database.db", "");

        assert!(!task_with(vec![]).should_skip(&storage));
    }

    #[test]
    fn all_markers_present_skips() {
        let storage = MemoryStorage::new();
        storage.add_file("/scan/images/a.jpg", "");
        storage.add_file("/scan/sparse/frames.bin", "");

        let task = task_with(vec![
            SkipMarker::path("/scan/images"),
            SkipMarker::path("/scan/sparse/frames.bin"),
        ]);
        assert!(task.should_skip(&storage));
    }

    #[test]
    fn one_missing_marker_runs() {
        let storage = MemoryStorage::new();
        storage.add_file("/scan/images/a.jpg", "");

        let task = task_with(vec![
            SkipMarker::path("/scan/images"),
            SkipMarker::path("/scan/sparse/frames.bin"),
        ]);
        assert!(!task.should_skip(&storage));
    }

    #[test]
    fn extension_marker_matches_only_that_extension() {
        let storage = MemoryStorage::new();
        storage.add_file("/scan/output/notes.txt", "");
        let marker = SkipMarker::any_with_extension("/scan/output", "ply");

        assert!(!marker.is_present(&storage));

        storage.add_file("/scan/output/splat_7000.ply", "");
        assert!(marker.is_present(&storage));
    }

    #[test]
    fn extension_marker_on_missing_dir_is_absent() {
        let storage = MemoryStorage::new();
        let marker = SkipMarker::any_with_extension("/scan/output", "ply");
        assert!(!marker.is_present(&storage));
    }

    #[test]
    fn marker_display_shows_pattern() {
        let marker = SkipMarker::any_with_extension("/scan/output", "ply");
        assert_eq!(marker.to_string(), "/scan/output/*.ply");
    }
}
