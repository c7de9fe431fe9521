//! Count & consistency validation.
//!
//! The [`Validator`] compares a scanned folder against an injected
//! [`ExpectationTable`]. Every check returns [`Finding`]s; only missing
//! paths are errors.
//!
//! - [`strays`]: files whose suffix is not allowed in a folder
//! - [`neuro`]: neuropsych filename and XML checks
//! - [`mt`]: peak-pick `.mt` table checks
//! - [`archive`]: overlap between new data and the archive

pub mod archive;
pub mod mt;
pub mod neuro;
pub mod strays;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classify::{tokenize, Category, Classifier, Delimiters, FileRecord, NameLayout};
use crate::config::{Config, ExpectationTable};
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{
    all_subdirs, ensure_dir, folder_key, scan_folder, ClassifiedTree, ScanError, Walker,
    WalkerConfig,
};
use crate::site::SiteError;

pub use archive::check_archive;
pub use mt::{check_picks, parse_mt, MtError, MtFile};
pub use neuro::{NeuroChecker, XmlRecord, XmlRow};
pub use strays::StrayDetector;

/// Order in which per-category count sections are reported.
const COUNT_SECTIONS: [Category; 4] = [Category::Avg, Category::Cnt, Category::Ps, Category::Dat];

/// Whole-operation failures of a check. Per-file problems are findings.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("No expected pick table for experiment '{0}'")]
    UnknownExperiment(String),
}

/// ERP folder validator.
#[derive(Debug, Clone)]
pub struct Validator {
    expectations: ExpectationTable,
    classifier: Classifier,
    identity_suffixes: Vec<String>,
    strays: StrayDetector,
}

impl Validator {
    #[must_use]
    pub fn new(expectations: ExpectationTable, classifier: Classifier) -> Self {
        let identity = crate::config::IdentityConfig::default();
        Self {
            expectations,
            classifier,
            identity_suffixes: identity.suffixes,
            strays: StrayDetector::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.expectations.clone(),
            Classifier::new(config.classifier.rule_table()),
        )
        .with_identity_suffixes(config.identity.suffixes.clone())
        .with_strays(StrayDetector::new(config.strays.allowed_suffixes.clone()))
    }

    #[must_use]
    pub fn with_identity_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.identity_suffixes = suffixes;
        self
    }

    #[must_use]
    pub fn with_strays(mut self, strays: StrayDetector) -> Self {
        self.strays = strays;
        self
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[must_use]
    pub fn expectations(&self) -> &ExpectationTable {
        &self.expectations
    }

    fn layout(&self) -> &NameLayout {
        self.classifier.table().layout()
    }

    /// One finding per file whose version token differs from the table.
    ///
    /// Every file is considered, recognized or not, as long as its
    /// experiment token names an experiment with an expected version.
    #[must_use]
    pub fn check_versions(&self, records: &[FileRecord]) -> Vec<Finding> {
        let layout = self.layout();
        records
            .iter()
            .filter_map(|record| {
                let tokens = tokenize(&record.file_name, Delimiters::Underscore);
                let experiment = tokens.get(layout.experiment)?;
                let expected = self.expectations.version(experiment)?;
                if tokens.get(layout.version) == Some(&expected) {
                    None
                } else {
                    Some(
                        Finding::new(
                            FindingKind::VersionMismatch,
                            format!("Check version for {}", record.file_name),
                        )
                        .with_path(&record.path),
                    )
                }
            })
            .collect()
    }

    /// Compare the count of `category` files per experiment with the
    /// table. An empty tree yields nothing.
    #[must_use]
    pub fn check_counts(
        &self,
        tree: &ClassifiedTree,
        category: Category,
        folder: &Path,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (key, _) in tree.folders() {
            for (experiment, expected) in self.expectations.counts_for(category) {
                let found = tree.count(key, category, experiment);
                if found != expected {
                    log::debug!(
                        "{}: {} {} files: expected {}, found {}",
                        key,
                        experiment,
                        category,
                        expected,
                        found
                    );
                    findings.push(
                        Finding::new(
                            FindingKind::CountMismatch,
                            format!(
                                "Incorrect number of {} {} files in {}",
                                experiment,
                                category,
                                folder.display()
                            ),
                        )
                        .with_path(folder),
                    );
                }
            }
        }
        findings
    }

    /// Every subject ID and run letter among the identity-bearing files
    /// directly inside `folder` must be the same.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `folder` is missing or not a directory.
    pub fn check_id_and_run_letter(&self, folder: &Path) -> Result<Vec<Finding>, ScanError> {
        ensure_dir(folder)?;
        let key = folder_key(folder);
        let layout = self.layout();

        let mut findings = Vec::new();
        let mut ids = BTreeSet::new();
        let mut letters = BTreeSet::new();

        for path in Walker::new(folder, WalkerConfig::shallow()).files() {
            let name = folder_key(&path);
            if !name.contains('.') || !self.identity_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
                continue;
            }

            let id_delimiters = if name.ends_with("avg") || name.ends_with("dat") {
                Delimiters::UnderscoreDotUpper
            } else {
                Delimiters::Underscore
            };
            let id = tokenize(&name, id_delimiters).get(layout.subject).copied();
            let letter = tokenize(&name, Delimiters::Underscore)
                .get(layout.run)
                .and_then(|t| t.chars().next());

            match (id, letter) {
                (Some(id), Some(letter)) => {
                    ids.insert(id.to_string());
                    letters.insert(letter);
                }
                _ => findings.push(
                    Finding::new(
                        FindingKind::MalformedName,
                        format!("Cannot read subject ID and run letter from {name}"),
                    )
                    .with_path(&path),
                ),
            }
        }

        if ids.len() > 1 {
            let ids: Vec<_> = ids.into_iter().collect();
            findings.push(
                Finding::new(
                    FindingKind::IdentityConflict,
                    format!("Folder {key} has more than one sub ID => {ids:?}"),
                )
                .with_path(folder),
            );
        }
        if letters.len() > 1 {
            let letters: Vec<_> = letters.into_iter().collect();
            findings.push(
                Finding::new(
                    FindingKind::IdentityConflict,
                    format!("Folder {key} has more than one run letter => {letters:?}"),
                )
                .with_path(folder),
            );
        }
        Ok(findings)
    }

    /// "There are N CAT files" for every category present in the tree.
    #[must_use]
    pub fn file_counts(tree: &ClassifiedTree) -> Vec<Finding> {
        tree.folders()
            .flat_map(|(_, categories)| {
                categories.iter().map(|(category, experiments)| {
                    Finding::note(format!(
                        "There are {} {} files",
                        experiments.len(),
                        category.as_str().to_uppercase()
                    ))
                })
            })
            .collect()
    }

    /// Run every ERP check on one folder.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `folder` is missing or not a directory.
    pub fn review_folder(&self, folder: &Path) -> Result<Report, ScanError> {
        let scan = scan_folder(folder, &self.classifier, WalkerConfig::default())?;
        let mut report = Report::new(folder.display().to_string());

        if scan.is_empty_dir() {
            let mut section = Section::new("FILES COUNT", "");
            section.push(Finding::note(format!("No files found in {}", folder.display())));
            report.push(section);
            return Ok(report);
        }

        report.push(
            Section::new("ERP VERSION CHECK", "All versions check out!")
                .with_findings(self.check_versions(&scan.records)),
        );

        let mut malformed = scan.malformed();
        malformed.extend(scan.walk_errors.iter().cloned());
        report.push(Section::new("UNREADABLE FILENAMES", "All filenames parsed!").with_findings(malformed));

        report.push(
            Section::new("FILES THAT DON'T BELONG", "No wild files found!")
                .with_findings(StrayDetector::findings(&self.strays.filter(&scan.records))),
        );

        report.push(Section::new("FILES COUNT", "").with_findings(Self::file_counts(&scan.tree)));

        for category in COUNT_SECTIONS {
            report.push(
                Section::new(
                    format!("MISSING EXPERIMENTS ({category})"),
                    format!("All {category} files found!"),
                )
                .with_findings(self.check_counts(&scan.tree, category, folder)),
            );
        }

        report.push(
            Section::new("CHECK SUBJECT ID & RUN LETTER", "All IDs & run letters check out!")
                .with_findings(self.check_id_and_run_letter(folder)?),
        );

        Ok(report)
    }

    /// Review `root` itself when it has no subdirectories, otherwise every
    /// directory below it except those under an excluded first-level name.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `root` or an excluded name does not exist.
    pub fn review_batch(&self, root: &Path, exclude: &[String]) -> Result<Vec<Report>, ScanError> {
        let folders = batch_folders(root, exclude)?;
        folders.iter().map(|f| self.review_folder(f)).collect()
    }
}

/// Folders a batch command visits: `root` alone when it has no
/// subdirectories, otherwise every directory below it, minus the excluded
/// first-level names.
///
/// # Errors
///
/// [`ScanError`] when `root` or an excluded name does not exist.
pub fn batch_folders(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    ensure_dir(root)?;
    for name in exclude {
        ensure_dir(&root.join(name))?;
    }

    let subdirs = all_subdirs(root);
    if subdirs.is_empty() {
        return Ok(vec![root.to_path_buf()]);
    }

    Ok(subdirs
        .into_iter()
        .filter(|dir| {
            let first = dir
                .strip_prefix(root)
                .ok()
                .and_then(|rel| rel.components().next())
                .map(|c| c.as_os_str().to_string_lossy().into_owned());
            !first.is_some_and(|name| exclude.contains(&name))
        })
        .collect())
}
