//! In-memory backend for tests and planning.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::Storage;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// [`Storage`] that keeps a directory tree in a map.
///
/// Paths are compared component-wise; no normalisation of `..` is done.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file (and its parent directories) with the given contents.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut nodes = self.nodes.lock();
        if let Some(parent) = path.parent() {
            for ancestor in parent.ancestors() {
                if ancestor.as_os_str().is_empty() {
                    continue;
                }
                nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
            }
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.into()));
    }

    /// Contents of the file at `path`, if it is a file.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes.lock().get(path.as_ref()) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Whether `path` is an existing file.
    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.nodes.lock().get(path.as_ref()), Some(Node::File(_)))
    }

    /// Number of files anywhere under `dir`.
    pub fn file_count_under(&self, dir: impl AsRef<Path>) -> usize {
        let dir = dir.as_ref();
        self.nodes
            .lock()
            .iter()
            .filter(|(path, node)| matches!(node, Node::File(_)) && path.starts_with(dir))
            .count()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn require_parent_dir(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match nodes.get(parent) {
            Some(Node::Dir) => Ok(()),
            _ => Err(not_found(parent)),
        },
        _ => Ok(()),
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        self.nodes.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.lock().get(path), Some(Node::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        let mut chain: Vec<&Path> = path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        chain.reverse();

        for dir in chain {
            match nodes.get(dir) {
                Some(Node::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a directory", dir.display()),
                    ));
                }
                Some(Node::Dir) => {}
                None => {
                    nodes.insert(dir.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        let moving_dir = match nodes.get(from) {
            Some(Node::Dir) => true,
            Some(Node::File(_)) => false,
            None => return Err(not_found(from)),
        };
        require_parent_dir(&nodes, to)?;
        if let Some(Node::Dir) = nodes.get(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is an existing directory", to.display()),
            ));
        }
        if moving_dir && to.starts_with(from) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }

        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|path| path.starts_with(from))
            .cloned()
            .collect();
        for path in moved {
            if let Some(node) = nodes.remove(&path) {
                let relative = path.strip_prefix(from).unwrap_or(Path::new(""));
                let target = if relative.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(relative)
                };
                nodes.insert(target, node);
            }
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        let data = match nodes.get(from) {
            Some(Node::File(data)) => data.clone(),
            Some(Node::Dir) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is a directory", from.display()),
                ));
            }
            None => return Err(not_found(from)),
        };
        require_parent_dir(&nodes, to)?;
        if let Some(Node::Dir) = nodes.get(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is an existing directory", to.display()),
            ));
        }
        nodes.insert(to.to_path_buf(), Node::File(data));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let nodes = self.nodes.lock();
        match nodes.get(dir) {
            Some(Node::Dir) => {}
            _ => return Err(not_found(dir)),
        }
        Ok(nodes
            .iter()
            .filter(|(path, node)| {
                matches!(node, Node::File(_)) && path.parent() == Some(dir)
            })
            .map(|(path, _)| path.clone())
            .collect())
    }
}
