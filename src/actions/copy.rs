//! No-overwrite file copy and rename.
//!
//! Destinations are opened with `create_new`, so an existing file is never
//! truncated even if it appears between the existence check and the copy.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::HashError;

/// Error type for copy and rename operations.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("{0} already exists")]
    DestinationExists(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl CopyError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AlreadyExists => Self::DestinationExists(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// The path the error is about, if known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceMissing(p) | Self::DestinationExists(p) | Self::PermissionDenied(p) => {
                Some(p)
            }
            Self::Io { path, .. } => Some(path),
            Self::Hash(_) => None,
        }
    }
}

/// Copy `src` to `dest`, failing if `dest` exists. Returns bytes copied.
///
/// # Errors
///
/// [`CopyError::DestinationExists`] when `dest` is already present; other
/// variants for read or write failures. A partially written destination
/// is removed.
pub fn copy_new(src: &Path, dest: &Path) -> Result<u64, CopyError> {
    let mut reader = File::open(src).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CopyError::SourceMissing(src.to_path_buf())
        } else {
            CopyError::from_io(src, e)
        }
    })?;

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| CopyError::from_io(dest, e))?;

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => {
            log::info!("Copied {} -> {}", src.display(), dest.display());
            Ok(bytes)
        }
        Err(e) => {
            drop(writer);
            if let Err(rm) = fs::remove_file(dest) {
                log::warn!("Could not remove partial copy {}: {}", dest.display(), rm);
            }
            Err(CopyError::from_io(dest, e))
        }
    }
}

/// Rename `from` to `to` unless `to` exists.
///
/// Implemented as hard link + unlink so the existence check and the
/// rename are one step.
///
/// # Errors
///
/// [`CopyError::DestinationExists`] when `to` is present.
pub fn rename_new(from: &Path, to: &Path) -> Result<(), CopyError> {
    fs::hard_link(from, to).map_err(|e| CopyError::from_io(to, e))?;
    fs::remove_file(from).map_err(|e| CopyError::from_io(from, e))?;
    log::info!("Renamed {} -> {}", from.display(), to.display());
    Ok(())
}

/// Create `dir` and its parents. Returns `true` when it was created.
///
/// # Errors
///
/// Returns [`CopyError`] if the directory cannot be created.
pub fn ensure_dir_created(dir: &Path) -> Result<bool, CopyError> {
    if dir.is_dir() {
        log::debug!("Directory {} already exists", dir.display());
        return Ok(false);
    }
    fs::create_dir_all(dir).map_err(|e| CopyError::from_io(dir, e))?;
    log::info!("Creating directory {}", dir.display());
    Ok(true)
}
