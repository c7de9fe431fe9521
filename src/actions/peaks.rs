//! Peak-pick result mover.
//!
//! The picked root holds one folder per experiment. Within it, a subject
//! is accepted when its files carry exactly the required extension set
//! (`h1 mt pdf` by default) and rejected otherwise. Accepted files go to
//! the experiment's site folder, rejected ones to its `reject` folder.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PeaksConfig;
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{child_dirs, ensure_dir, folder_key, Walker, WalkerConfig};
use crate::site::Site;

use super::copy::{copy_new, ensure_dir_created, CopyError};
use super::migrate::MigrateError;

/// Fields of a peak-pick result name, split on `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakName {
    pub experiment: String,
    pub subject_id: String,
    pub extension: String,
}

impl PeakName {
    /// `None` when the name has fewer than five tokens.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let tokens: Vec<&str> = name.split(['_', '.']).collect();
        if tokens.len() < 5 {
            return None;
        }
        Some(Self {
            experiment: tokens[0].to_string(),
            subject_id: tokens[3].to_string(),
            extension: tokens[tokens.len() - 1].to_string(),
        })
    }
}

/// Verdict for one subject within one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// One subject's result files in one experiment folder.
#[derive(Debug, Clone)]
pub struct PeakSubject {
    pub experiment: String,
    pub subject_id: String,
    pub files: Vec<PathBuf>,
    pub extensions: BTreeSet<String>,
}

impl PeakSubject {
    #[must_use]
    pub fn verdict(&self, required: &BTreeSet<String>) -> Verdict {
        if &self.extensions == required {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }
}

/// Group the result files of one experiment folder by subject.
///
/// Files whose extension is not in `known` are ignored. Names that do not
/// split into enough tokens are returned as findings.
#[must_use]
pub fn collect_subjects(
    exp_dir: &Path,
    known: &BTreeSet<String>,
) -> (Vec<PeakSubject>, Vec<Finding>) {
    let experiment = folder_key(exp_dir);
    let mut by_subject: BTreeMap<String, PeakSubject> = BTreeMap::new();
    let mut malformed = Vec::new();

    for path in Walker::new(exp_dir, WalkerConfig::shallow()).files() {
        let name = folder_key(&path);
        let Some(parsed) = PeakName::parse(&name) else {
            malformed.push(
                Finding::new(FindingKind::MalformedName, format!("Cannot parse {name}"))
                    .with_path(&path),
            );
            continue;
        };
        if !known.contains(&parsed.extension) {
            continue;
        }
        let subject = by_subject
            .entry(parsed.subject_id.clone())
            .or_insert_with(|| PeakSubject {
                experiment: experiment.clone(),
                subject_id: parsed.subject_id.clone(),
                files: Vec::new(),
                extensions: BTreeSet::new(),
            });
        subject.files.push(path);
        subject.extensions.insert(parsed.extension);
    }

    (by_subject.into_values().collect(), malformed)
}

/// Totals from a peak move, counted as distinct subjects.
#[derive(Debug, Clone, Default)]
pub struct PeakMoveSummary {
    /// (experiment, subject) pairs.
    pub accepted: BTreeSet<(String, String)>,
    pub rejected: BTreeSet<(String, String)>,
    pub copied: Vec<PathBuf>,
    pub findings: Vec<Finding>,
    pub failures: Vec<(PathBuf, String)>,
}

impl PeakMoveSummary {
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Total of {} subs accepted.\nTotal of {} subs rejected.",
            self.accepted.len(),
            self.rejected.len()
        )
    }

    #[must_use]
    pub fn report(&self, root: &Path) -> Report {
        let mut section = Section::new("PEAK MOVER", self.summary());
        section.findings.extend(self.findings.iter().cloned());
        section.findings.extend(self.failures.iter().map(|(path, reason)| {
            Finding::new(FindingKind::FileOperationFailed, reason.clone()).with_path(path)
        }));
        if !section.passed() {
            section.push(Finding::note(self.summary()));
        }
        let mut report = Report::new(root.display().to_string());
        report.push(section);
        report
    }
}

/// Sort every subject under `picked_root` into the accepted or rejected
/// tree for `site`.
///
/// # Errors
///
/// [`MigrateError::Scan`] for a missing root and [`MigrateError::Site`]
/// when any subject ID belongs to another site. Both are checked before
/// anything is copied.
pub fn move_peaks(
    picked_root: &Path,
    site: Site,
    config: &PeaksConfig,
) -> Result<PeakMoveSummary, MigrateError> {
    ensure_dir(picked_root)?;
    let required: BTreeSet<String> = config.extensions.iter().cloned().collect();

    let mut plan = Vec::new();
    let mut summary = PeakMoveSummary::default();
    for exp_dir in child_dirs(picked_root)? {
        let (subjects, malformed) = collect_subjects(&exp_dir, &required);
        summary.findings.extend(malformed);
        plan.push((folder_key(&exp_dir), subjects));
    }

    for (_, subjects) in &plan {
        for subject in subjects {
            site.check_subject(&subject.subject_id)?;
        }
    }

    for (experiment, subjects) in plan {
        let accepted_dir = config.accepted_dir(&experiment, site);
        let rejected_dir = config.rejected_dir(&experiment, site);
        log::info!("{} files to be moved", experiment.to_uppercase());

        for subject in subjects {
            let verdict = subject.verdict(&required);
            let dest_dir = match verdict {
                Verdict::Accepted => &accepted_dir,
                Verdict::Rejected => &rejected_dir,
            };
            if let Err(e) = ensure_dir_created(dest_dir) {
                summary.failures.push((dest_dir.clone(), e.to_string()));
                continue;
            }

            let key = (experiment.clone(), subject.subject_id.clone());
            for file in &subject.files {
                let dest = dest_dir.join(folder_key(file));
                match copy_new(file, &dest) {
                    Ok(_) => {
                        summary.copied.push(dest);
                        match verdict {
                            Verdict::Accepted => summary.accepted.insert(key.clone()),
                            Verdict::Rejected => summary.rejected.insert(key.clone()),
                        };
                    }
                    Err(CopyError::DestinationExists(_)) => {
                        log::warn!("{} already exists!", dest.display());
                        summary.findings.push(
                            Finding::new(
                                FindingKind::DestinationCollision,
                                format!("{} already exists!", dest.display()),
                            )
                            .with_path(&dest),
                        );
                    }
                    Err(e) => {
                        log::warn!("Failed to copy {}: {}", file.display(), e);
                        summary.failures.push((file.clone(), e.to_string()));
                    }
                }
            }
        }
    }

    log::info!("{}", summary.summary().replace('\n', " "));
    Ok(summary)
}
