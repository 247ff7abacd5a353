//! Builds the ordered stage list for one run.

use crate::config::Settings;
use crate::layout::RunLayout;
use crate::models::{MapperBackend, RunConfig};
use crate::task::{CommandSpec, SkipMarker, Task};

use super::Pipeline;

pub const FEATURE_EXTRACTION: &str = "Feature Extraction";
pub const FEATURE_MATCHING: &str = "Feature Matching";
pub const MAPPING: &str = "Mapping";
pub const IMAGE_UNDISTORTION: &str = "Image Undistortion";
pub const TRAINING: &str = "Training";

/// Written by the undistorter next to the undistorted model; together with
/// `images/` it marks undistortion as done.
pub const UNDISTORTION_MARKER_FILE: &str = "frames.bin";
/// Extension of the snapshots the trainer exports.
pub const EXPORT_EXTENSION: &str = "ply";
const EXPORT_FILE_NAME: &str = "splat.ply";

/// Assemble the stages for `config` over `layout`.
///
/// Order is fixed: extraction, matching, mapping, then undistortion and
/// training for the trainable model kind. Every command and marker
/// captures paths from `layout` now; nothing is resolved later.
pub fn build_pipeline(layout: &RunLayout, config: &RunConfig, settings: &Settings) -> Pipeline {
    let mut pipeline = Pipeline::new()
        .with_task(feature_extraction(layout, settings))
        .with_task(feature_matching(layout, config, settings))
        .with_task(mapping(layout, settings));

    if let Some(training) = &layout.training {
        pipeline = pipeline
            .with_task(image_undistortion(layout, settings))
            .with_task(
                Task::new(
                    TRAINING,
                    CommandSpec::new(settings.tools.trainer.as_str())
                        .arg(&layout.work_root)
                        .flag("--num-iters", config.training.steps.to_string())
                        .flag("--save-every", config.training.export_every.to_string())
                        .flag("--output", training.export_dir.join(EXPORT_FILE_NAME)),
                )
                .with_skip_marker(SkipMarker::any_with_extension(
                    &training.export_dir,
                    EXPORT_EXTENSION,
                )),
            );
    }

    pipeline
}

fn feature_extraction(layout: &RunLayout, settings: &Settings) -> Task {
    let recon = &settings.reconstruction;
    let single_camera = if recon.single_camera { "1" } else { "0" };

    Task::new(
        FEATURE_EXTRACTION,
        CommandSpec::new(settings.tools.colmap.as_str())
            .arg("feature_extractor")
            .flag("--image_path", layout.image_dir())
            .flag("--database_path", &layout.intermediate_db_path)
            .flag("--ImageReader.single_camera", single_camera)
            .flag("--ImageReader.camera_model", &recon.camera_model),
    )
    .with_skip_marker(SkipMarker::path(&layout.intermediate_db_path))
}

// No marker: completeness of matching can't be told from one artifact.
fn feature_matching(layout: &RunLayout, config: &RunConfig, settings: &Settings) -> Task {
    Task::new(
        FEATURE_MATCHING,
        CommandSpec::new(settings.tools.colmap.as_str())
            .arg(config.matcher.subcommand())
            .flag("--database_path", &layout.intermediate_db_path),
    )
}

fn mapping(layout: &RunLayout, settings: &Settings) -> Task {
    let program = match settings.reconstruction.mapper {
        MapperBackend::Glomap => settings.tools.glomap.as_str(),
        MapperBackend::Colmap => settings.tools.colmap.as_str(),
    };

    Task::new(
        MAPPING,
        CommandSpec::new(program)
            .arg("mapper")
            .flag("--database_path", &layout.intermediate_db_path)
            .flag("--image_path", layout.image_dir())
            .flag("--output_path", &layout.sparse_dir),
    )
    .with_skip_marker(SkipMarker::path(&layout.sparse_primary_subdir))
}

fn image_undistortion(layout: &RunLayout, settings: &Settings) -> Task {
    let mut task = Task::new(
        IMAGE_UNDISTORTION,
        CommandSpec::new(settings.tools.colmap.as_str())
            .arg("image_undistorter")
            .flag("--image_path", layout.image_dir())
            .flag("--input_path", &layout.sparse_primary_subdir)
            .flag("--output_path", &layout.work_root)
            .flag("--output_type", "COLMAP"),
    );
    if let Some(training) = &layout.training {
        task = task.with_skip_marker(SkipMarker::path(&training.undistorted_images_dir));
    }
    task.with_skip_marker(SkipMarker::path(
        layout.sparse_dir.join(UNDISTORTION_MARKER_FILE),
    ))
}
