use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A per-process working directory below the work root
///
/// The directory is created by [`ScopedWorkingDirectory::create`] and removed
/// by [`ScopedWorkingDirectory::release`], or on drop if it was never released.
/// The process current directory is left untouched; callers pass
/// [`ScopedWorkingDirectory::path`] to whatever needs it.
#[derive(Debug)]
pub struct ScopedWorkingDirectory {
    path: PathBuf,
    released: bool,
}

impl ScopedWorkingDirectory {
    /// Creates `<parent>/<pid>`
    pub fn create(parent: &Path) -> io::Result<Self> {
        Self::create_named(parent, &std::process::id().to_string())
    }

    pub fn create_named(parent: &Path, name: &str) -> io::Result<Self> {
        let path = parent.join(name);
        fs::create_dir_all(&path)?;
        debug!("Created working directory {}", path.display());
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory tree; an already removed directory is not an error
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        remove_tree(&self.path)
    }
}

impl Drop for ScopedWorkingDirectory {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_tree(&self.path) {
            warn!("Failed to remove working directory {}: {}", self.path.display(), e);
        }
    }
}

/// Removes `path` recursively; a missing directory is not an error
pub(crate) fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
