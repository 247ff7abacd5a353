//! Resolves the run layout from a user-supplied source directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::{LayoutError, LayoutResult};
use super::types::RunLayout;
use crate::logging::RunLogger;
use crate::models::RunConfig;
use crate::storage::Storage;

/// Folder names downstream stages use for their own working directories.
pub const RESERVED_SOURCE_NAMES: [&str; 2] = ["input", "images"];
/// Name a reserved source folder is renamed to.
pub const CANONICAL_SOURCE_NAME: &str = "source";

/// Where `source` has to be renamed to, or `None` when its name is fine.
///
/// Matching is exact and case-sensitive.
pub fn disambiguated_path(source: &Path) -> Option<PathBuf> {
    let name = source.file_name()?.to_str()?;
    if RESERVED_SOURCE_NAMES.contains(&name) {
        source.parent().map(|p| p.join(CANONICAL_SOURCE_NAME))
    } else {
        None
    }
}

/// Every `stride`-th entry of `files` sorted by file name, starting at 0.
pub fn select_every_nth(mut files: Vec<PathBuf>, stride: usize) -> Vec<PathBuf> {
    files.sort_by_key(|p| p.file_name().map(OsString::from));
    files.into_iter().step_by(stride.max(1)).collect()
}

/// Turns a source directory into a [`RunLayout`], renaming and staging
/// images as needed.
pub struct PathResolver {
    storage: Arc<dyn Storage>,
    logger: Arc<RunLogger>,
}

impl PathResolver {
    pub fn new(storage: Arc<dyn Storage>, logger: Arc<RunLogger>) -> Self {
        Self { storage, logger }
    }

    /// Resolve the layout for `image_root`.
    ///
    /// Side effects, in order: at most one folder rename, at most one
    /// staging directory filled with copies, and creation of the output
    /// directories the layout references.
    pub fn resolve(&self, image_root: &Path, config: &RunConfig) -> LayoutResult<RunLayout> {
        let source = std::path::absolute(image_root)
            .map_err(|e| LayoutError::io(format!("resolving {}", image_root.display()), e))?;

        if !self.storage.is_dir(&source) {
            return Err(LayoutError::SourceNotFound(source));
        }

        let source = self.disambiguate(&source)?;
        let layout = RunLayout::derive(source, config.stride, config.model)?;

        if let Some(staging) = &layout.staging_dir {
            self.subsample(&layout.source_dir, staging, config.stride)?;
        }

        for dir in layout.output_dirs() {
            self.storage
                .create_dir_all(dir)
                .map_err(|e| LayoutError::io(format!("creating {}", dir.display()), e))?;
        }

        tracing::debug!(?layout, "resolved run layout");
        Ok(layout)
    }

    /// Rename a source folder called `input` or `images` to `source`.
    ///
    /// Returns the path to use from now on.
    pub fn disambiguate(&self, source: &Path) -> LayoutResult<PathBuf> {
        let Some(target) = disambiguated_path(source) else {
            return Ok(source.to_path_buf());
        };

        if self.storage.exists(&target) {
            return Err(LayoutError::RenameCollision {
                from: source.to_path_buf(),
                to: target,
            });
        }

        self.storage
            .rename(source, &target)
            .map_err(|e| LayoutError::Rename {
                from: source.to_path_buf(),
                to: target.clone(),
                source: e,
            })?;

        self.logger.info(&format!(
            "Renamed image folder from {} to: {}",
            source.file_name().unwrap_or_default().to_string_lossy(),
            target.display()
        ));
        Ok(target)
    }

    /// Copy every `stride`-th image of `source` (sorted by name) into
    /// `staging`. Returns the staged file paths.
    ///
    /// Files already in `staging` that are not part of the new selection
    /// are deleted, so the folder always holds exactly the staged images.
    /// Subdirectories are left alone.
    pub fn subsample(
        &self,
        source: &Path,
        staging: &Path,
        stride: usize,
    ) -> LayoutResult<Vec<PathBuf>> {
        self.storage
            .create_dir_all(staging)
            .map_err(|e| LayoutError::io(format!("creating {}", staging.display()), e))?;

        let files = self
            .storage
            .list_files(source)
            .map_err(|e| LayoutError::io(format!("listing {}", source.display()), e))?;
        let total = files.len();
        let selected = select_every_nth(files, stride);
        self.clear_stale(staging, &selected)?;

        let mut staged = Vec::with_capacity(selected.len());
        for file in selected {
            let Some(name) = file.file_name() else {
                continue;
            };
            let target = staging.join(name);
            self.storage.copy_file(&file, &target).map_err(|e| {
                LayoutError::io(format!("copying {}", file.display()), e)
            })?;
            staged.push(target);
        }

        self.logger.info(&format!(
            "Staged {} of {} images (interval {}) in {}",
            staged.len(),
            total,
            stride,
            staging.display()
        ));
        Ok(staged)
    }

    fn clear_stale(&self, staging: &Path, keep: &[PathBuf]) -> LayoutResult<()> {
        let existing = self
            .storage
            .list_files(staging)
            .map_err(|e| LayoutError::io(format!("listing {}", staging.display()), e))?;

        let mut removed = 0;
        for file in existing {
            let wanted = keep.iter().any(|k| k.file_name() == file.file_name());
            if wanted {
                continue;
            }
            self.storage
                .remove_file(&file)
                .map_err(|e| LayoutError::io(format!("removing {}", file.display()), e))?;
            removed += 1;
        }

        if removed > 0 {
            tracing::debug!(removed, staging = %staging.display(), "cleared stale staged images");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InputSource, ModelKind};
    use crate::storage::MemoryStorage;

    fn resolver(storage: &Arc<MemoryStorage>) -> PathResolver {
        PathResolver::new(storage.clone(), Arc::new(RunLogger::silent()))
    }

    fn add_images(storage: &MemoryStorage, dir: &str, count: usize) {
        // Insert in reverse so ordering comes from sorting, not insertion.
        for i in (0..count).rev() {
            storage.add_file(format!("{}/img_{:02}.jpg", dir, i), format!("{}", i));
        }
    }

    #[test]
    fn reserved_names_are_renamed() {
        assert_eq!(
            disambiguated_path(Path::new("/scan/images")),
            Some(PathBuf::from("/scan/source"))
        );
        assert_eq!(
            disambiguated_path(Path::new("/scan/input")),
            Some(PathBuf::from("/scan/source"))
        );
    }

    #[test]
    fn other_names_are_left_alone() {
        for name in ["/scan/Images", "/scan/INPUT", "/scan/photos", "/scan/images2"] {
            assert_eq!(disambiguated_path(Path::new(name)), None, "{}", name);
        }
    }

    #[test]
    fn rename_moves_folder_to_source() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/images", 2);

        let path = resolver(&storage)
            .disambiguate(Path::new("/scan/images"))
            .unwrap();

        assert_eq!(path, PathBuf::from("/scan/source"));
        assert!(storage.is_file("/scan/source/img_00.jpg"));
        assert!(!storage.exists(Path::new("/scan/images")));
    }

    #[test]
    fn rename_collision_is_a_configuration_error() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/input", 1);
        add_images(&storage, "/scan/source", 1);

        let err = resolver(&storage)
            .disambiguate(Path::new("/scan/input"))
            .unwrap_err();

        assert!(matches!(err, LayoutError::RenameCollision { .. }));
        assert!(storage.is_file("/scan/input/img_00.jpg"));
    }

    #[test]
    fn subsample_takes_every_kth_sorted_file() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/source", 10);

        let staged = resolver(&storage)
            .subsample(Path::new("/scan/source"), Path::new("/scan/input"), 3)
            .unwrap();

        let names: Vec<String> = staged
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["img_00.jpg", "img_03.jpg", "img_06.jpg", "img_09.jpg"]);
        // Copies, not moves.
        assert_eq!(storage.file_count_under("/scan/source"), 10);
    }

    #[test]
    fn subsample_count_is_ceil_n_over_k() {
        for (n, k) in [(0usize, 2usize), (1, 4), (7, 2), (9, 3), (10, 4)] {
            let storage = Arc::new(MemoryStorage::new());
            storage.create_dir_all(Path::new("/scan/source")).unwrap();
            add_images(&storage, "/scan/source", n);

            let staged = resolver(&storage)
                .subsample(Path::new("/scan/source"), Path::new("/scan/input"), k)
                .unwrap();

            assert_eq!(staged.len(), n.div_ceil(k), "n={} k={}", n, k);
            assert!(storage.is_dir(Path::new("/scan/input")));
        }
    }

    #[test]
    fn restaging_with_another_interval_drops_stale_copies() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/source", 10);
        storage.create_dir_all(Path::new("/scan/input/nested")).unwrap();
        let resolver = resolver(&storage);

        resolver
            .subsample(Path::new("/scan/source"), Path::new("/scan/input"), 2)
            .unwrap();
        assert_eq!(storage.file_count_under("/scan/input"), 5);

        resolver
            .subsample(Path::new("/scan/source"), Path::new("/scan/input"), 3)
            .unwrap();

        let mut names: Vec<String> = storage
            .list_files(Path::new("/scan/input"))
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["img_00.jpg", "img_03.jpg", "img_06.jpg", "img_09.jpg"]);
        assert!(storage.is_dir(Path::new("/scan/input/nested")));
    }

    #[test]
    fn resolve_with_stride_one_creates_no_staging() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/photos", 4);
        let config = RunConfig::new(InputSource::images("/scan/photos"))
            .with_model(ModelKind::ReconstructionOnly);

        let layout = resolver(&storage)
            .resolve(Path::new("/scan/photos"), &config)
            .unwrap();

        assert_eq!(layout.staging_dir, None);
        assert!(!storage.exists(Path::new("/scan/input")));
        assert!(storage.is_dir(Path::new("/scan/distorted")));
        assert!(storage.is_dir(Path::new("/scan/sparse")));
        assert!(!storage.exists(Path::new("/scan/output")));
    }

    #[test]
    fn resolve_renames_then_stages() {
        let storage = Arc::new(MemoryStorage::new());
        add_images(&storage, "/scan/images", 5);
        let config = RunConfig::new(InputSource::images("/scan/images")).with_stride(2);

        let layout = resolver(&storage)
            .resolve(Path::new("/scan/images"), &config)
            .unwrap();

        assert_eq!(layout.source_dir, PathBuf::from("/scan/source"));
        assert_eq!(layout.image_dir(), Path::new("/scan/input"));
        assert_eq!(storage.file_count_under("/scan/input"), 3);
        assert!(storage.is_dir(Path::new("/scan/output")));
    }

    #[test]
    fn resolve_missing_source_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let config = RunConfig::new(InputSource::images("/scan/photos"));

        let err = resolver(&storage)
            .resolve(Path::new("/scan/photos"), &config)
            .unwrap_err();
        assert!(matches!(err, LayoutError::SourceNotFound(_)));
    }
}
