//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing directories
//! and collecting regular files. Entries are visited in file-name order so
//! that every scan of an unchanged tree yields the same sequence.
//!
//! # Example
//!
//! ```no_run
//! use labqc::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/data/new_site_data"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Sorted, read-only directory walker.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the directory tree, yielding regular files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration, so one unreadable directory never hides the rest.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }
        let skip_hidden = self.config.skip_hidden;

        walk_dir
            .into_iter()
            .filter_entry(move |e| !(skip_hidden && Self::is_hidden(e)))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        if entry.path_is_symlink() && !self.config.follow_symlinks {
                            log::trace!("Skipping symlink: {}", entry.path().display());
                        }
                        return None;
                    }

                    let size = match entry.metadata() {
                        Ok(m) => m.len(),
                        Err(e) => {
                            let path = entry.path().to_path_buf();
                            log::warn!("Cannot read metadata for {}: {}", path.display(), e);
                            return Some(Err(ScanError::Io {
                                path,
                                source: std::io::Error::other(e.to_string()),
                            }));
                        }
                    };

                    Some(Ok(FileEntry::new(entry.into_path(), size)))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    let err = match e.into_io_error() {
                        Some(io) => ScanError::from_io(&path, io),
                        None => ScanError::Io {
                            path,
                            source: std::io::Error::other("filesystem loop detected"),
                        },
                    };
                    Some(Err(err))
                }
            })
    }

    /// Walk and collect file paths, logging and skipping errors.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.walk()
            .filter_map(|r| match r {
                Ok(f) => Some(f.path),
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            })
            .collect()
    }
}
