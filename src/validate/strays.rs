//! Stray-file detection.
//!
//! A pure filter: lists files whose names do not end with an allowed
//! suffix. Nothing is deleted here; the list is for human review.

use std::path::{Path, PathBuf};

use crate::classify::FileRecord;
use crate::config::StrayConfig;
use crate::report::{Finding, FindingKind};
use crate::scanner::{ensure_dir, ScanError, Walker, WalkerConfig};

#[derive(Debug, Clone)]
pub struct StrayDetector {
    allowed: Vec<String>,
}

impl Default for StrayDetector {
    fn default() -> Self {
        Self::new(StrayConfig::default().allowed_suffixes)
    }
}

impl StrayDetector {
    #[must_use]
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Stray files among already-scanned records, in record order.
    #[must_use]
    pub fn filter(&self, records: &[FileRecord]) -> Vec<PathBuf> {
        records
            .iter()
            .filter(|r| !self.is_allowed(&r.file_name))
            .map(|r| r.path.clone())
            .collect()
    }

    /// Every stray file under `folder`, recursively, in walk order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `folder` is missing or not a directory.
    pub fn detect(&self, folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
        ensure_dir(folder)?;
        Ok(Walker::new(folder, WalkerConfig::default())
            .files()
            .into_iter()
            .filter(|p| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                !self.is_allowed(&name)
            })
            .collect())
    }

    #[must_use]
    pub fn findings(paths: &[PathBuf]) -> Vec<Finding> {
        paths
            .iter()
            .map(|p| Finding::new(FindingKind::StrayFile, p.display().to_string()).with_path(p))
            .collect()
    }
}
