//! Target registration and source discovery.
//!
//! Directories are rescanned on every refresh, one glob per registered
//! extension. Files are matched once by their own extension.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Classification of a registered path, fixed when the path is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Directory,
    File,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Directory => write!(f, "directory"),
            TargetKind::File => write!(f, "file"),
        }
    }
}

/// Ordered set of directories and files to scan.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path.
    ///
    /// Existing directories and regular files are kept; anything else is
    /// dropped without error so optional locations can be listed up front.
    /// Adding a path that is already registered changes nothing.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Option<TargetKind> {
        let path = path.as_ref();
        let kind = if path.is_dir() {
            TargetKind::Directory
        } else if path.is_file() {
            TargetKind::File
        } else {
            debug!(path = %path.display(), "Ignoring target that does not exist");
            return None;
        };

        let list = match kind {
            TargetKind::Directory => &mut self.directories,
            TargetKind::File => &mut self.files,
        };
        if !list.iter().any(|existing| existing == path) {
            debug!(path = %path.display(), kind = %kind, "Registered target");
            list.push(path.to_path_buf());
        }
        Some(kind)
    }

    /// Register several paths, returning how many were accepted.
    pub fn add_all<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .filter(|path| self.add(path).is_some())
            .count()
    }

    /// Registered directories in the order they were added.
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Registered files in the order they were added.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn kind_of(&self, path: &Path) -> Option<TargetKind> {
        if self.directories.iter().any(|p| p == path) {
            Some(TargetKind::Directory)
        } else if self.files.iter().any(|p| p == path) {
            Some(TargetKind::File)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// List regular files directly inside `dir` whose name ends with `.<extension>`.
///
/// A name that is only the suffix (`.json`) has no extension and is left out,
/// the same as when such a file is registered explicitly. Results are sorted by file name. A directory that no longer exists yields
/// an empty list.
pub fn scan_directory(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %dir.display(), "Target directory disappeared, treating as empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let suffix = format!(".{}", extension);
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.len() > suffix.len() && name.ends_with(&suffix) && path.is_file() {
            matches.push(path);
        }
    }
    matches.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(matches)
}

/// Extension used to pick a handler for an explicitly registered file.
pub fn file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}
