//! Post-run relocation of the reconstruction model.

use crate::layout::RunLayout;
use crate::storage::Storage;

use super::errors::{RunError, RunResult};

/// Model files that belong in the primary reconstruction folder.
pub const SPARSE_ARTIFACTS: [&str; 3] = ["cameras.bin", "images.bin", "points3D.bin"];

/// Move any model files sitting directly in `sparse/` into `sparse/0`.
///
/// Creates `sparse/0` if needed. Missing files are skipped, so calling this
/// twice moves nothing the second time. Returns the names that were moved.
pub fn relocate_artifacts(storage: &dyn Storage, layout: &RunLayout) -> RunResult<Vec<String>> {
    let target_dir = &layout.sparse_primary_subdir;
    storage.create_dir_all(target_dir).map_err(|e| {
        RunError::finalize_failed(format!("creating {}", target_dir.display()), e)
    })?;

    let mut moved = Vec::new();
    for name in SPARSE_ARTIFACTS {
        let from = layout.sparse_dir.join(name);
        if !storage.exists(&from) {
            tracing::debug!(path = %from.display(), "no artifact to relocate");
            continue;
        }
        let to = target_dir.join(name);
        storage
            .rename(&from, &to)
            .map_err(|e| RunError::finalize_failed(format!("moving {}", from.display()), e))?;
        moved.push(name.to_string());
    }
    Ok(moved)
}
