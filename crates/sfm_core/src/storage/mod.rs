//! Filesystem capability used by the runner, resolver and orchestrator.
//!
//! Every directory creation, existence check, copy, move and file deletion
//! the pipeline performs goes through [`Storage`]. Production code uses [`FsStorage`];
//! tests use [`MemoryStorage`] so skip logic and path resolution can be
//! exercised without touching disk.

mod fs;
mod memory;

use std::io;
use std::path::{Path, PathBuf};

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Minimal filesystem surface the pipeline depends on.
pub trait Storage: Send + Sync {
    /// Whether anything (file or directory) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents. Existing directories are reused.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Move a file or directory. Used both for folder renames and for
    /// relocating artifacts; an existing destination file is replaced.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy a regular file, replacing the destination if present.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a regular file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Regular files directly inside `dir`, in no particular order.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}
