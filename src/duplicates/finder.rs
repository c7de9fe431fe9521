//! Whole-tree duplicate finder.
//!
//! Every file under the root is hashed in full with BLAKE3; files are then
//! grouped by digest. There is no size pre-filter: the digest alone
//! decides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::{phase, ProgressCallback};
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{ensure_dir, FileEntry, Hasher, ScanError, Walker, WalkerConfig};

use super::groups::{group_by_hash, DuplicateGroup};

/// Errors that abort a duplicate scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct DedupSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub duplicate_groups: usize,
    /// Duplicate files, not counting the first of each group.
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    /// Files that could not be walked or hashed.
    pub errors: Vec<Finding>,
}

/// Runs walk → hash → group over one directory tree.
///
/// ```no_run
/// use labqc::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let (groups, summary) = DuplicateFinder::with_defaults()
///     .find_duplicates(Path::new("/data/new_site_data"))
///     .unwrap();
/// println!("{} groups out of {} files", groups.len(), summary.total_files);
/// ```
pub struct DuplicateFinder {
    hasher: Hasher,
    walker_config: WalkerConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl DuplicateFinder {
    #[must_use]
    pub fn new(walker_config: WalkerConfig) -> Self {
        Self {
            hasher: Hasher::new(),
            walker_config,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(WalkerConfig::default())
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Find every group of two or more files with identical content.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] when `path` is missing or not a directory.
    /// Unreadable files are recorded in [`DedupSummary::errors`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, DedupSummary), FinderError> {
        ensure_dir(path)?;
        log::info!("Starting duplicate scan of {}", path.display());
        let mut summary = DedupSummary::default();

        if let Some(cb) = &self.progress {
            cb.on_phase_start(phase::WALKING, 0);
        }
        let mut files: Vec<FileEntry> = Vec::new();
        for result in Walker::new(path, self.walker_config.clone()).walk() {
            match result {
                Ok(file) => {
                    files.push(file);
                    if let Some(cb) = &self.progress {
                        cb.on_progress(files.len(), &path.display().to_string());
                    }
                }
                Err(e) => summary
                    .errors
                    .push(Finding::new(FindingKind::FileOperationFailed, e.to_string())),
            }
        }
        if let Some(cb) = &self.progress {
            cb.on_phase_end(phase::WALKING);
        }

        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();
        log::debug!("Hashing {} files", files.len());

        if let Some(cb) = &self.progress {
            cb.on_phase_start(phase::HASHING, files.len());
        }
        let mut hashed = Vec::with_capacity(files.len());
        for (idx, file) in files.into_iter().enumerate() {
            if let Some(cb) = &self.progress {
                cb.on_progress(idx + 1, &file.path.display().to_string());
            }
            match self.hasher.full_hash(&file.path) {
                Ok(hash) => {
                    if let Some(cb) = &self.progress {
                        cb.on_item_completed(file.size);
                    }
                    hashed.push((hash, file));
                }
                Err(e) => {
                    log::warn!("{}", e);
                    summary.errors.push(
                        Finding::new(FindingKind::FileOperationFailed, e.to_string())
                            .with_path(&file.path),
                    );
                }
            }
        }
        if let Some(cb) = &self.progress {
            cb.on_phase_end(phase::HASHING);
        }

        let groups = group_by_hash(hashed);
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(|g| g.len() - 1).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        log::info!(
            "Found {} duplicate groups ({} extra copies)",
            summary.duplicate_groups,
            summary.duplicate_files
        );

        Ok((groups, summary))
    }
}

/// Render groups and per-file errors as a report.
#[must_use]
pub fn dedup_report(root: &Path, groups: &[DuplicateGroup], summary: &DedupSummary) -> Report {
    let mut section = Section::new("DUPLICATE CHECK", "No duplicates found!");
    for group in groups {
        section.findings.extend(group.findings());
    }
    section.findings.extend(summary.errors.iter().cloned());

    let mut report = Report::new(root.display().to_string());
    report.push(section);
    report
}

/// Paths of every duplicate member, for machine-readable output.
#[must_use]
pub fn duplicate_paths(groups: &[DuplicateGroup]) -> Vec<PathBuf> {
    groups.iter().flat_map(DuplicateGroup::paths).collect()
}
