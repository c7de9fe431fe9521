//! Migration of new site data into the canonical archive.
//!
//! New data is laid out as `<new-data>/<subject-id>/<files>` and lands in
//! `<target>/<subject-id>/`. The whole plan is built and checked before
//! anything is written; copying then proceeds file by file and keeps going
//! past individual failures.
//!
//! ```no_run
//! use labqc::actions::migrate::{check_site_target, MigrationPlan, Migrator};
//! use std::path::Path;
//!
//! let new_data = Path::new("/data/new/neuropsych");
//! let target = Path::new("/vol01/raw_data/neuropsych/suny");
//! check_site_target(new_data, target).unwrap();
//! let plan = MigrationPlan::build(new_data, target).unwrap();
//! let summary = Migrator::new().run(&plan);
//! println!("{}", summary.summary());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytesize::ByteSize;
use thiserror::Error;

use crate::progress::{phase, ProgressCallback};
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{child_dirs, ensure_dir, folder_key, Hasher, ScanError, Walker, WalkerConfig};
use crate::site::{Site, SiteError};

use super::copy::ensure_dir_created;
use super::rerun::place_file;

/// Whole-migration failures. Nothing has been written when one is
/// returned.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Site(#[from] SiteError),

    /// Files named for a subject do not all sit in that subject's folder.
    #[error("Subject {subject}: {counted} file(s) named for it but {planned} planned for {subject}/")]
    Inconsistent {
        subject: String,
        counted: usize,
        planned: usize,
    },
}

/// One file to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    pub subject: String,
    pub source: PathBuf,
    pub dest_dir: PathBuf,
}

/// The complete, validated copy plan.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Subjects whose destination folder already exists.
    pub existing: BTreeSet<String>,
    /// Subjects whose destination folder must be created.
    pub to_create: BTreeSet<String>,
    /// Sorted by destination folder, then source path.
    pub copies: Vec<PlannedCopy>,
}

/// Subject ID of a file: its first `_` token.
fn subject_of(path: &Path) -> String {
    let name = folder_key(path);
    name.split('_').next().unwrap_or_default().to_string()
}

impl MigrationPlan {
    /// Scan `new_data` and plan every copy into `target`.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Scan`] when either path is missing and
    /// [`MigrateError::Inconsistent`] when the per-subject file counts
    /// and the planned copies disagree.
    pub fn build(new_data: &Path, target: &Path) -> Result<Self, MigrateError> {
        ensure_dir(new_data)?;
        ensure_dir(target)?;

        let mut counted: BTreeMap<String, usize> = BTreeMap::new();
        for file in Walker::new(new_data, WalkerConfig::default()).files() {
            *counted.entry(subject_of(&file)).or_default() += 1;
        }

        let mut planned: BTreeMap<String, usize> = BTreeMap::new();
        let mut copies = Vec::new();
        for dir in child_dirs(new_data)? {
            let subject = folder_key(&dir);
            let files = Walker::new(&dir, WalkerConfig::shallow()).files();
            *planned.entry(subject.clone()).or_default() += files.len();
            copies.extend(files.into_iter().map(|source| PlannedCopy {
                subject: subject.clone(),
                source,
                dest_dir: target.join(&subject),
            }));
        }

        let subjects: BTreeSet<&String> = counted.keys().chain(planned.keys()).collect();
        for subject in subjects {
            let c = counted.get(subject).copied().unwrap_or(0);
            let p = planned.get(subject).copied().unwrap_or(0);
            if c != p {
                return Err(MigrateError::Inconsistent {
                    subject: subject.clone(),
                    counted: c,
                    planned: p,
                });
            }
        }

        let (existing, to_create): (BTreeSet<String>, BTreeSet<String>) = planned
            .keys()
            .cloned()
            .partition(|subject| target.join(subject).is_dir());

        copies.sort_by(|a, b| (&a.dest_dir, &a.source).cmp(&(&b.dest_dir, &b.source)));
        log::debug!(
            "Planned {} copies for {} subjects ({} new folders)",
            copies.len(),
            planned.len(),
            to_create.len()
        );

        Ok(Self {
            source: new_data.to_path_buf(),
            target: target.to_path_buf(),
            existing,
            to_create,
            copies,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// The plan as notes, for a dry run.
    #[must_use]
    pub fn report(&self) -> Report {
        let mut section = Section::new(
            "MIGRATION PLAN",
            format!(
                "{} file(s) for {} subject(s) would be copied to {}",
                self.copies.len(),
                self.existing.len() + self.to_create.len(),
                self.target.display()
            ),
        );
        for subject in &self.to_create {
            section.push(Finding::note(format!(
                "Would create {}",
                self.target.join(subject).display()
            )));
        }
        for copy in &self.copies {
            section.push(
                Finding::note(format!(
                    "{} -> {}",
                    copy.source.display(),
                    copy.dest_dir.display()
                ))
                .with_path(&copy.source),
            );
        }
        let mut report = Report::new(self.source.display().to_string());
        report.push(section);
        report
    }
}

/// Check that `target` is a site folder and that every subject folder in
/// `new_data` belongs to that site.
///
/// # Errors
///
/// [`MigrateError::Site`] for an unknown site name, mixed sites or an ID
/// from another site.
pub fn check_site_target(new_data: &Path, target: &Path) -> Result<Site, MigrateError> {
    ensure_dir(new_data)?;
    let site: Site = folder_key(target).parse()?;
    let subjects: Vec<String> = child_dirs(new_data)?.iter().map(|d| folder_key(d)).collect();
    site.check_all(subjects.iter().map(String::as_str))?;
    Ok(site)
}

/// Outcome of executing a [`MigrationPlan`].
#[derive(Debug, Clone, Default)]
pub struct MigrationSummary {
    pub source: PathBuf,
    pub target: PathBuf,
    pub created_dirs: Vec<PathBuf>,
    /// Destination paths that received a new file.
    pub written: Vec<PathBuf>,
    /// Distinct subjects with at least one new file.
    pub subjects_moved: BTreeSet<String>,
    pub bytes_copied: u64,
    pub findings: Vec<Finding>,
    /// Files that could not be copied, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl MigrationSummary {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        let base = format!(
            "Total of {} subjects moved from {} to {} ({})",
            self.subjects_moved.len(),
            self.source.display(),
            self.target.display(),
            ByteSize::b(self.bytes_copied)
        );
        if self.all_succeeded() {
            base
        } else {
            format!("{base}, {} file(s) failed", self.failures.len())
        }
    }

    #[must_use]
    pub fn report(&self) -> Report {
        let mut section = Section::new("MIGRATION", self.summary());
        section.findings.extend(
            self.created_dirs
                .iter()
                .map(|d| Finding::note(format!("Making new directory {}", d.display()))),
        );
        section.findings.extend(self.findings.iter().cloned());
        section.findings.extend(self.failures.iter().map(|(path, reason)| {
            Finding::new(FindingKind::FileOperationFailed, reason.clone()).with_path(path)
        }));
        if !section.passed() {
            section.push(Finding::note(self.summary()));
        }

        let mut report = Report::new(self.source.display().to_string());
        report.push(section);
        report
    }
}

/// Executes migration plans.
#[derive(Default)]
pub struct Migrator {
    hasher: Hasher,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Migrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Create missing subject folders, then copy every planned file.
    #[must_use]
    pub fn run(&self, plan: &MigrationPlan) -> MigrationSummary {
        let mut summary = MigrationSummary {
            source: plan.source.clone(),
            target: plan.target.clone(),
            ..MigrationSummary::default()
        };

        for subject in &plan.to_create {
            let dir = plan.target.join(subject);
            match ensure_dir_created(&dir) {
                Ok(true) => summary.created_dirs.push(dir),
                Ok(false) => log::info!("This directory ({}) already exists", dir.display()),
                Err(e) => {
                    log::warn!("{}", e);
                    summary.failures.push((dir, e.to_string()));
                }
            }
        }

        if let Some(cb) = &self.progress {
            cb.on_phase_start(phase::COPYING, plan.copies.len());
        }
        for (idx, copy) in plan.copies.iter().enumerate() {
            if let Some(cb) = &self.progress {
                cb.on_progress(idx + 1, &copy.source.display().to_string());
            }
            match place_file(&copy.source, &copy.dest_dir, &self.hasher) {
                Ok(placement) => {
                    if let Some(dest) = placement.written() {
                        summary.written.push(dest.to_path_buf());
                        summary.subjects_moved.insert(copy.subject.clone());
                    }
                    summary.bytes_copied += placement.bytes();
                    if let Some(cb) = &self.progress {
                        cb.on_item_completed(placement.bytes());
                    }
                    summary.findings.extend(placement.finding(&copy.source));
                }
                Err(e) => {
                    log::warn!("Failed to copy {}: {}", copy.source.display(), e);
                    summary.failures.push((copy.source.clone(), e.to_string()));
                }
            }
        }
        if let Some(cb) = &self.progress {
            cb.on_phase_end(phase::COPYING);
        }

        log::info!("{}", summary.summary());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let new_data = tmp.path().join("new");
        let target = tmp.path().join("suny");
        fs::create_dir_all(new_data.join("40001001")).unwrap();
        fs::create_dir_all(new_data.join("40001002")).unwrap();
        fs::create_dir_all(target.join("40001001")).unwrap();
        fs::write(new_data.join("40001001/40001001_TOLT_a_1_sum.txt"), b"a").unwrap();
        fs::write(new_data.join("40001001/40001001_1.xml"), b"b").unwrap();
        fs::write(new_data.join("40001002/40001002_1.xml"), b"c").unwrap();
        (tmp, new_data, target)
    }

    #[test]
    fn test_plan_partitions_subjects() {
        let (_tmp, new_data, target) = setup();
        let plan = MigrationPlan::build(&new_data, &target).unwrap();
        assert!(plan.existing.contains("40001001"));
        assert!(plan.to_create.contains("40001002"));
        assert_eq!(plan.copies.len(), 3);
        assert!(!target.join("40001002").exists());
    }

    #[test]
    fn test_plan_rejects_misfiled_subject() {
        let (_tmp, new_data, target) = setup();
        fs::write(new_data.join("40001002/40001001_2.xml"), b"d").unwrap();
        let err = MigrationPlan::build(&new_data, &target).unwrap_err();
        assert!(matches!(err, MigrateError::Inconsistent { .. }));
    }

    #[test]
    fn test_run_copies_and_counts_subjects() {
        let (_tmp, new_data, target) = setup();
        let plan = MigrationPlan::build(&new_data, &target).unwrap();
        let summary = Migrator::new().run(&plan);
        assert!(summary.all_succeeded());
        assert_eq!(summary.subjects_moved.len(), 2);
        assert_eq!(summary.written.len(), 3);
        assert_eq!(summary.bytes_copied, 3);
        assert!(target.join("40001002/40001002_1.xml").exists());
    }

    #[test]
    fn test_second_run_copies_nothing() {
        let (_tmp, new_data, target) = setup();
        let plan = MigrationPlan::build(&new_data, &target).unwrap();
        Migrator::new().run(&plan);

        let plan = MigrationPlan::build(&new_data, &target).unwrap();
        let summary = Migrator::new().run(&plan);
        assert!(summary.written.is_empty());
        assert!(summary.subjects_moved.is_empty());
        assert_eq!(summary.findings.len(), 3);
    }

    #[test]
    fn test_site_target_checks() {
        let (tmp, new_data, target) = setup();
        assert_eq!(check_site_target(&new_data, &target).unwrap(), Site::Suny);

        let wrong = tmp.path().join("iowa");
        fs::create_dir_all(&wrong).unwrap();
        assert!(matches!(
            check_site_target(&new_data, &wrong),
            Err(MigrateError::Site(SiteError::Mismatch { .. }))
        ));

        let bogus = tmp.path().join("archive");
        assert!(matches!(
            check_site_target(&new_data, &bogus),
            Err(MigrateError::Site(SiteError::UnknownSite(_)))
        ));
    }
}
