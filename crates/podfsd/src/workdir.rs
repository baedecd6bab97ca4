//! Lock-protected base directory for relative request paths.
//!
//! The worker never calls `chdir`. Instead `cd` swaps the base held here and
//! every command resolves its paths through [`WorkingDirectory::resolve`] at
//! the moment it touches the filesystem. A `cd` racing with in-flight requests
//! can still change which base they observe; it can never tear the value.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::dispatch::DispatchError;

/// Shared, cloneable handle to the current base directory.
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    current: Arc<RwLock<PathBuf>>,
}

impl WorkingDirectory {
    /// Starts from an explicit base directory.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            current: Arc::new(RwLock::new(base.into())),
        }
    }

    /// Starts from the directory the process was launched in.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the launch directory cannot be determined.
    pub fn from_process() -> io::Result<Self> {
        env::current_dir().map(Self::new)
    }

    /// Snapshot of the current base directory.
    pub fn current(&self) -> PathBuf {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves `path` against the current base; absolute paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current().join(path)
        }
    }

    /// Moves the base to `path`, which must name an existing directory.
    ///
    /// Returns the canonical directory now in effect.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::OperationFailure` when the target does not
    /// exist or is not a directory.
    pub fn change_to(&self, path: &Path) -> Result<PathBuf, DispatchError> {
        let target = self.resolve(path);
        let canonical = fs::canonicalize(&target).map_err(DispatchError::at(&target))?;
        let metadata = fs::metadata(&canonical).map_err(DispatchError::at(&canonical))?;
        if !metadata.is_dir() {
            return Err(DispatchError::at(&target)(io::Error::from(
                io::ErrorKind::NotADirectory,
            )));
        }

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        current.clone_from(&canonical);
        Ok(canonical)
    }
}
