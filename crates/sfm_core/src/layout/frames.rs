//! Frame extraction from a video input.

use std::path::Path;

use crate::config::{FrameSettings, ToolSettings};
use crate::task::{CommandSpec, SkipMarker, Task};

pub const FRAME_EXTRACTION_TASK: &str = "Frame Extraction";
/// Fixed-width, monotonically increasing frame file names.
pub const FRAME_NAME_PATTERN: &str = "%04d.jpg";

/// Task that samples `fps` frames per second from `video` into `target`.
///
/// Skipped whenever `target` already exists, even if it is incomplete.
pub fn frame_extraction_task(
    video: &Path,
    target: &Path,
    fps: f64,
    tools: &ToolSettings,
    frames: &FrameSettings,
) -> Task {
    let quality = frames.jpeg_quality.to_string();
    let command = CommandSpec::new(tools.ffmpeg.as_str())
        .flag("-i", video)
        .flag("-qscale:v", &quality)
        .flag("-qmin", &quality)
        .flag("-vf", format!("fps={}", fps))
        .arg(target.join(FRAME_NAME_PATTERN));

    Task::new(FRAME_EXTRACTION_TASK, command)
        .with_skip_marker(SkipMarker::path(target))
        .with_prepared_dir(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn builds_decoder_command() {
        let task = frame_extraction_task(
            Path::new("/data/walk.mp4"),
            Path::new("/data/source"),
            2.5,
            &ToolSettings::default(),
            &FrameSettings::default(),
        );

        assert_eq!(task.command().program(), "ffmpeg");
        let args: Vec<OsString> = task.command().args().to_vec();
        assert_eq!(args[0], OsString::from("-i"));
        assert_eq!(args[1], OsString::from("/data/walk.mp4"));
        assert!(args.contains(&OsString::from("fps=2.5")));
        assert_eq!(args.last(), Some(&OsString::from("/data/source/%04d.jpg")));
    }

    #[test]
    fn skips_on_existing_target_and_prepares_it() {
        let task = frame_extraction_task(
            Path::new("/data/walk.mp4"),
            Path::new("/data/source"),
            2.0,
            &ToolSettings::default(),
            &FrameSettings::default(),
        );

        assert_eq!(
            task.skip_markers(),
            &[SkipMarker::Path(PathBuf::from("/data/source"))]
        );
        assert_eq!(task.prepare_dirs(), &[PathBuf::from("/data/source")]);
    }
}
