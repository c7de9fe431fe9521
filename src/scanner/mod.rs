//! Walking session folders, classifying what is in them, and hashing
//! file content.
//!
//! - [`walker`]: sorted, single-threaded traversal (walkdir)
//! - [`tree`]: one [`ClassifiedTree`] per reviewed folder
//! - [`hasher`]: streaming BLAKE3 digests for dedup and rerun checks
//!
//! ```no_run
//! use labqc::classify::Classifier;
//! use labqc::scanner::{scan_folder, WalkerConfig};
//! use std::path::Path;
//!
//! let scan = scan_folder(Path::new("/data/40001001"), &Classifier::erp(), WalkerConfig::default())
//!     .unwrap();
//! for finding in scan.malformed() {
//!     eprintln!("{}", finding.message);
//! }
//! ```

pub mod hasher;
pub mod tree;
pub mod walker;

use std::fs;
use std::path::{Path, PathBuf};

pub use hasher::{hash_to_hex, Hash, Hasher};
pub use tree::{scan_folder, ClassifiedTree, ScanResult};
pub use walker::Walker;

/// A discovered regular file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Maximum depth below the root; `Some(1)` lists only direct children.
    pub max_depth: Option<usize>,
}

impl WalkerConfig {
    /// Only the files directly inside the root.
    #[must_use]
    pub fn shallow() -> Self {
        Self {
            max_depth: Some(1),
            ..Self::default()
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Check that `path` exists and is a directory.
///
/// # Errors
///
/// [`ScanError::NotFound`] or [`ScanError::NotADirectory`].
pub fn ensure_dir(path: &Path) -> Result<(), ScanError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(path.to_path_buf())),
        Err(e) => Err(ScanError::from_io(path, e)),
    }
}

/// Direct subdirectories of `root`, sorted by name.
///
/// # Errors
///
/// Returns [`ScanError`] when `root` cannot be read.
pub fn child_dirs(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| ScanError::from_io(root, e))? {
        let entry = entry.map_err(|e| ScanError::from_io(root, e))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Every directory below `root` (not including `root`), sorted.
#[must_use]
pub fn all_subdirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_dir() => Some(e.into_path()),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .collect();
    dirs.sort();
    dirs
}

/// The last path component, used as the folder key in reports.
#[must_use]
pub fn folder_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
