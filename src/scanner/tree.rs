//! Classified view of one scanned folder.
//!
//! [`scan_folder`] walks a folder, classifies every file and groups the
//! recognized ones into a [`ClassifiedTree`]: folder key → category →
//! experiment codes in walk order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::classify::{Category, Classifier, FileRecord};
use crate::report::{Finding, FindingKind};

use super::{ensure_dir, folder_key, ScanError, Walker, WalkerConfig};

/// Folder key → category → experiment codes observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTree {
    folders: BTreeMap<String, BTreeMap<Category, Vec<String>>>,
}

impl ClassifiedTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from records, keyed by `key`. Only recognized records
    /// contribute.
    #[must_use]
    pub fn from_records(key: &str, records: &[FileRecord]) -> Self {
        let mut tree = Self::new();
        for record in records {
            if let Some(fields) = record.fields() {
                for &category in record.categories() {
                    tree.insert(key, category, &fields.experiment);
                }
            }
        }
        tree
    }

    pub fn insert(&mut self, folder: &str, category: Category, experiment: &str) {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .entry(category)
            .or_default()
            .push(experiment.to_string());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn folders(&self) -> impl Iterator<Item = (&String, &BTreeMap<Category, Vec<String>>)> {
        self.folders.iter()
    }

    /// Experiment codes of one category in one folder.
    #[must_use]
    pub fn experiments(&self, folder: &str, category: Category) -> &[String] {
        self.folders
            .get(folder)
            .and_then(|cats| cats.get(&category))
            .map_or(&[], Vec::as_slice)
    }

    /// How many files of `category` carry experiment code `experiment`.
    #[must_use]
    pub fn count(&self, folder: &str, category: Category, experiment: &str) -> usize {
        self.experiments(folder, category)
            .iter()
            .filter(|e| *e == experiment)
            .count()
    }
}

/// Everything learned from one read-only pass over a folder.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Last path component of `root`.
    pub key: String,
    /// Raw number of regular files found, recognized or not.
    pub file_count: usize,
    pub records: Vec<FileRecord>,
    pub tree: ClassifiedTree,
    /// Per-file walk errors; the scan continued past them.
    pub walk_errors: Vec<Finding>,
}

impl ScanResult {
    /// One finding per file whose name matched a rule but did not tokenize.
    #[must_use]
    pub fn malformed(&self) -> Vec<Finding> {
        self.records
            .iter()
            .filter_map(|r| {
                r.name_error()
                    .map(|e| Finding::new(FindingKind::MalformedName, e.to_string()).with_path(&r.path))
            })
            .collect()
    }

    /// Whether the folder held no files at all.
    #[must_use]
    pub fn is_empty_dir(&self) -> bool {
        self.file_count == 0
    }
}

/// Walk `root`, classify every regular file and build the tree.
///
/// # Errors
///
/// Returns [`ScanError`] when `root` is missing or not a directory.
/// Errors on individual entries are collected in
/// [`ScanResult::walk_errors`] instead.
pub fn scan_folder(
    root: &Path,
    classifier: &Classifier,
    config: WalkerConfig,
) -> Result<ScanResult, ScanError> {
    ensure_dir(root)?;
    let key = folder_key(root);

    let mut records = Vec::new();
    let mut walk_errors = Vec::new();
    for entry in Walker::new(root, config).walk() {
        match entry {
            Ok(file) => records.push(classifier.classify(&file.path)),
            Err(e) => walk_errors.push(Finding::new(FindingKind::FileOperationFailed, e.to_string())),
        }
    }

    let tree = ClassifiedTree::from_records(&key, &records);
    log::debug!(
        "Scanned {}: {} files, {} recognized",
        root.display(),
        records.len(),
        records.iter().filter(|r| r.is_recognized()).count()
    );

    Ok(ScanResult {
        root: root.to_path_buf(),
        key,
        file_count: records.len(),
        records,
        tree,
        walk_errors,
    })
}
