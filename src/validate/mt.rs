//! Peak-pick `.mt` table checks.
//!
//! An `.mt` file has one whitespace-separated row per pick; column 0 is
//! the subject ID, columns 5 and 7 are the condition and the peak name.
//! A subject is correctly picked when its `<condition>_<peak>` counts
//! equal the expected table for the experiment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PeaksConfig;
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{ensure_dir, folder_key, Walker, WalkerConfig};
use crate::site::Site;

use super::CheckError;

/// Columns a data row must have to carry subject, condition and peak.
const MIN_COLUMNS: usize = 8;

#[derive(Debug, Error)]
pub enum MtError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {path}: expected at least {MIN_COLUMNS} columns")]
    MalformedLine { path: PathBuf, line: usize },

    #[error("No pick rows in {0}")]
    Empty(PathBuf),
}

/// Parsed content of one `.mt` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtFile {
    pub subject_id: String,
    /// `<condition>_<peak>` → number of rows.
    pub picks: BTreeMap<String, usize>,
}

/// Parse one `.mt` file.
///
/// # Errors
///
/// Returns [`MtError`] when the file cannot be read, a data row has too
/// few columns, or there are no data rows.
pub fn parse_mt(path: &Path) -> Result<MtFile, MtError> {
    let content = fs::read_to_string(path).map_err(|source| MtError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut subject_id = None;
    let mut picks = BTreeMap::new();
    for (idx, line) in content.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < MIN_COLUMNS {
            return Err(MtError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
            });
        }
        subject_id.get_or_insert_with(|| cols[0].to_string());
        *picks.entry(format!("{}_{}", cols[5], cols[7])).or_insert(0) += 1;
    }

    match subject_id {
        Some(subject_id) => Ok(MtFile { subject_id, picks }),
        None => Err(MtError::Empty(path.to_path_buf())),
    }
}

/// Experiment code for a peak-pick directory: the first three characters
/// of its name, or of its parent's name when the directory is a site.
#[must_use]
pub fn experiment_for_dir(dir: &Path) -> String {
    let name = folder_key(dir);
    let is_site = Site::ALL.iter().any(|s| s.name() == name);
    let source = if is_site {
        dir.parent().map(folder_key).unwrap_or_default()
    } else {
        name
    };
    source.chars().take(3).collect()
}

/// Check every `.mt` file under `dir` against the expected pick table.
///
/// # Errors
///
/// Returns [`CheckError`] when `dir` is missing or its experiment has no
/// expected table.
pub fn check_picks(dir: &Path, peaks: &PeaksConfig) -> Result<Report, CheckError> {
    ensure_dir(dir)?;
    let experiment = experiment_for_dir(dir);
    let expected = peaks
        .expected_picks
        .get(&experiment)
        .ok_or_else(|| CheckError::UnknownExperiment(experiment.clone()))?;

    let files = Walker::new(dir, WalkerConfig::default()).files();
    let mt_files: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.to_string_lossy().ends_with("mt"))
        .collect();

    let mut section = Section::new("PEAK PICK CHECK", "All files correctly picked!");
    section.push(Finding::note(format!("Found {} mt files.", mt_files.len())));

    let mut by_subject: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for path in mt_files {
        match parse_mt(path) {
            Ok(mt) => {
                by_subject.entry(mt.subject_id).or_default().extend(mt.picks);
            }
            Err(e) => {
                log::warn!("{}", e);
                section.push(Finding::new(FindingKind::MalformedName, e.to_string()).with_path(path));
            }
        }
    }

    for (subject, picks) in &by_subject {
        if picks == expected {
            continue;
        }
        log::debug!("{} picks differ from the {} table", subject, experiment);
        let h1s: Vec<&PathBuf> = files
            .iter()
            .filter(|p| {
                let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                name.contains(subject.as_str()) && name.ends_with("avg.h1")
            })
            .collect();
        if h1s.is_empty() {
            section.push(Finding::new(
                FindingKind::ContentCheck,
                format!("Incorrect picks for {subject}; no avg.h1 file found"),
            ));
        }
        for h1 in h1s {
            section.push(Finding::new(FindingKind::ContentCheck, h1.display().to_string()).with_path(h1));
        }
    }

    let mut report = Report::new(dir.display().to_string());
    report.push(section);
    Ok(report)
}
