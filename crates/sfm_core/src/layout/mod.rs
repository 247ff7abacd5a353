//! Run layout resolution.
//!
//! Derives the canonical directory layout from one user-supplied source
//! directory:
//!
//! ```text
//! <work_root>/
//!     source/            images (renamed from input/ or images/)
//!     input/             every k-th image, when an interval > 1 is used
//!     distorted/database.db
//!     sparse/0/          primary reconstruction
//!     images/            undistorted images (3dgs)
//!     output/            training exports (3dgs)
//! ```

mod errors;
mod frames;
mod resolver;
mod types;

pub use errors::{LayoutError, LayoutResult};
pub use frames::{frame_extraction_task, FRAME_EXTRACTION_TASK, FRAME_NAME_PATTERN};
pub use resolver::{
    disambiguated_path, select_every_nth, PathResolver, CANONICAL_SOURCE_NAME,
    RESERVED_SOURCE_NAMES,
};
pub use types::{
    RunLayout, TrainingLayout, DATABASE_FILE_NAME, DISTORTED_DIR_NAME, EXPORT_DIR_NAME,
    SPARSE_DIR_NAME, SPARSE_PRIMARY_NAME, STAGING_DIR_NAME, UNDISTORTED_IMAGES_NAME,
};
