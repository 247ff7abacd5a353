//! The resolved directory layout of one run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::{LayoutError, LayoutResult};
use crate::models::ModelKind;

/// Folder subsampled images are copied into, next to the source folder.
pub const STAGING_DIR_NAME: &str = "input";
/// Holds the feature database.
pub const DISTORTED_DIR_NAME: &str = "distorted";
pub const DATABASE_FILE_NAME: &str = "database.db";
pub const SPARSE_DIR_NAME: &str = "sparse";
/// The first (primary) reconstruction written by the mapper.
pub const SPARSE_PRIMARY_NAME: &str = "0";
/// Undistorted images written into the run root.
pub const UNDISTORTED_IMAGES_NAME: &str = "images";
pub const EXPORT_DIR_NAME: &str = "output";

/// Extra paths used by the undistortion and training stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingLayout {
    /// `<work_root>/images`, produced by the undistorter.
    pub undistorted_images_dir: PathBuf,
    /// `<work_root>/output`, where training snapshots are exported.
    pub export_dir: PathBuf,
}

/// Absolute paths a pipeline run operates over, derived from one source
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLayout {
    /// Source images (after any disambiguation rename).
    pub source_dir: PathBuf,
    /// Subsampled copy of the source images, when an interval > 1 is used.
    pub staging_dir: Option<PathBuf>,
    /// Parent of the source directory; every output lands under it.
    pub work_root: PathBuf,
    pub distorted_dir: PathBuf,
    pub intermediate_db_path: PathBuf,
    pub sparse_dir: PathBuf,
    pub sparse_primary_subdir: PathBuf,
    pub training: Option<TrainingLayout>,
}

impl RunLayout {
    /// Derive every path from an absolute source directory. Pure; touches
    /// nothing on disk.
    pub fn derive(source_dir: PathBuf, stride: usize, model: ModelKind) -> LayoutResult<Self> {
        if !source_dir.is_absolute() {
            return Err(LayoutError::invalid_source(
                &source_dir,
                "path must be absolute",
            ));
        }
        let work_root = match source_dir.parent() {
            Some(parent) if source_dir.file_name().is_some() => parent.to_path_buf(),
            _ => {
                return Err(LayoutError::invalid_source(
                    &source_dir,
                    "it has no parent directory",
                ))
            }
        };

        let distorted_dir = work_root.join(DISTORTED_DIR_NAME);
        let sparse_dir = work_root.join(SPARSE_DIR_NAME);
        let training = model.is_trainable().then(|| TrainingLayout {
            undistorted_images_dir: work_root.join(UNDISTORTED_IMAGES_NAME),
            export_dir: work_root.join(EXPORT_DIR_NAME),
        });

        Ok(Self {
            staging_dir: (stride > 1).then(|| work_root.join(STAGING_DIR_NAME)),
            intermediate_db_path: distorted_dir.join(DATABASE_FILE_NAME),
            sparse_primary_subdir: sparse_dir.join(SPARSE_PRIMARY_NAME),
            source_dir,
            work_root,
            distorted_dir,
            sparse_dir,
            training,
        })
    }

    /// Directory the reconstruction stages read images from.
    pub fn image_dir(&self) -> &Path {
        self.staging_dir.as_deref().unwrap_or(&self.source_dir)
    }

    /// Directories the resolver materializes before returning the layout.
    pub fn output_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![self.distorted_dir.as_path(), self.sparse_dir.as_path()];
        if let Some(training) = &self.training {
            dirs.push(training.export_dir.as_path());
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_paths_from_parent() {
        let layout =
            RunLayout::derive(PathBuf::from("/data/scan/source"), 1, ModelKind::ReconstructionOnly)
                .unwrap();

        assert_eq!(layout.work_root, PathBuf::from("/data/scan"));
        assert_eq!(
            layout.intermediate_db_path,
            PathBuf::from("/data/scan/distorted/database.db")
        );
        assert_eq!(layout.sparse_primary_subdir, PathBuf::from("/data/scan/sparse/0"));
        assert_eq!(layout.staging_dir, None);
        assert_eq!(layout.training, None);
        assert_eq!(layout.image_dir(), Path::new("/data/scan/source"));
    }

    #[test]
    fn stride_adds_staging_dir() {
        let layout =
            RunLayout::derive(PathBuf::from("/data/scan/source"), 3, ModelKind::Trainable).unwrap();

        assert_eq!(layout.image_dir(), Path::new("/data/scan/input"));
        let training = layout.training.as_ref().unwrap();
        assert_eq!(training.export_dir, PathBuf::from("/data/scan/output"));
        assert_eq!(layout.output_dirs().len(), 3);
    }

    #[test]
    fn relative_source_is_rejected() {
        let err = RunLayout::derive(PathBuf::from("scan/source"), 1, ModelKind::Trainable)
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidSource { .. }));
    }

    #[test]
    fn filesystem_root_is_rejected() {
        let err =
            RunLayout::derive(PathBuf::from("/"), 1, ModelKind::Trainable).unwrap_err();
        assert!(err.to_string().contains("no parent"));
    }
}
