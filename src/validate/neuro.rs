//! Neuropsych folder checks.
//!
//! A subject folder holds `txt` and `sum.txt` result files plus one XML
//! session file. Checks cover the filenames, the XML content, and the
//! agreement between the two.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::classify::{parse_neuro_name, NeuroKind, NeuroName};
use crate::config::NeuroConfig;
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{
    all_subdirs, child_dirs, ensure_dir, folder_key, ScanError, Walker, WalkerConfig,
};

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Tags read from a session XML file, one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlRecord {
    pub subject_id: Option<String>,
    pub session_code: Option<String>,
    pub motivation: Option<String>,
    pub dob: Option<String>,
    pub test_date: Option<String>,
    pub gender: Option<String>,
    pub hand: Option<String>,
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"^\s*<(\w+)>(.*?)</(\w+)>").expect("tag pattern is a valid regex")
    })
}

impl XmlRecord {
    /// Parse the line-oriented tags of an XML document.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut record = Self::default();
        for line in content.lines() {
            let Some(caps) = tag_regex().captures(line) else {
                continue;
            };
            if caps[1] != caps[3] {
                continue;
            }
            let value = Some(caps[2].to_string());
            match &caps[1] {
                "SubjectID" => record.subject_id = value,
                "SessionCode" => record.session_code = value,
                "Motivation" => record.motivation = value,
                "DOB" => record.dob = value,
                "TestDate" => record.test_date = value,
                "Gender" => record.gender = value,
                "Hand" => record.hand = value,
                _ => {}
            }
        }
        record
    }

    /// # Errors
    ///
    /// Returns the I/O error when the file cannot be read.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }
}

/// One row of the XML summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlRow {
    #[serde(rename = "Subject ID")]
    pub subject_id: String,
    #[serde(rename = "Test Date")]
    pub test_date: String,
    #[serde(rename = "DOB")]
    pub dob: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Handedness")]
    pub handedness: String,
    #[serde(rename = "Run Letter")]
    pub run_letter: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Filenames of one subject folder, grouped by bucket.
#[derive(Debug, Clone, Default)]
pub struct NeuroFolder {
    pub path: PathBuf,
    pub key: String,
    pub sum_txt: Vec<NeuroName>,
    pub txt: Vec<NeuroName>,
    pub xml: Vec<(PathBuf, NeuroName)>,
    pub malformed: Vec<Finding>,
}

impl NeuroFolder {
    fn bucket(&self, kind: NeuroKind) -> &[NeuroName] {
        match kind {
            NeuroKind::SumTxt => &self.sum_txt,
            NeuroKind::Txt => &self.txt,
            NeuroKind::Xml => &[],
        }
    }
}

/// Neuropsych checks parameterized by [`NeuroConfig`].
#[derive(Debug, Clone, Default)]
pub struct NeuroChecker {
    config: NeuroConfig,
}

impl NeuroChecker {
    #[must_use]
    pub fn new(config: NeuroConfig) -> Self {
        Self { config }
    }

    /// Read and group the filenames directly inside `folder`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `folder` is missing or not a directory.
    pub fn parse_folder(&self, folder: &Path) -> Result<NeuroFolder, ScanError> {
        ensure_dir(folder)?;
        let mut parsed = NeuroFolder {
            path: folder.to_path_buf(),
            key: folder_key(folder),
            ..NeuroFolder::default()
        };

        for path in Walker::new(folder, WalkerConfig::shallow()).files() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match parse_neuro_name(&name) {
                Ok(n) => match n.kind {
                    NeuroKind::SumTxt => parsed.sum_txt.push(n),
                    NeuroKind::Txt => parsed.txt.push(n),
                    NeuroKind::Xml => parsed.xml.push((path, n)),
                },
                Err(e) => parsed
                    .malformed
                    .push(Finding::new(FindingKind::MalformedName, e.to_string()).with_path(&path)),
            }
        }
        Ok(parsed)
    }

    /// Filename checks for one bucket (`txt` or `sum.txt`).
    #[must_use]
    pub fn check_filenames(&self, folder: &NeuroFolder, kind: NeuroKind) -> Vec<Finding> {
        let ext = kind.label();
        let key = &folder.key;
        let names = folder.bucket(kind);
        let mut findings = Vec::new();

        for name in names {
            let known = name
                .experiment
                .as_ref()
                .is_some_and(|e| self.config.experiments.contains(e));
            if !known {
                findings.push(Finding::new(
                    FindingKind::MissingExperiment,
                    format!("Error: Missing experiment for a {ext} file for {key}"),
                ));
            }
        }

        let ids: BTreeSet<&str> = names.iter().map(|n| n.subject_id.as_str()).collect();
        if ids.len() > 1 {
            findings.push(Finding::new(
                FindingKind::IdentityConflict,
                format!("Error: Incorrect ID in {ext} file for {key}"),
            ));
        }
        for name in names {
            if name.subject_id.len() != self.config.id_length {
                findings.push(Finding::new(
                    FindingKind::ContentCheck,
                    format!("Error: Sub ID incorrect length in {ext} file for {key}"),
                ));
            }
        }

        let count = names.iter().filter(|n| n.extension == ext).count();
        if count != self.config.files_per_extension {
            findings.push(Finding::new(
                FindingKind::CountMismatch,
                format!("Error: Missing a {ext} file for {key}"),
            ));
        }
        findings
    }

    /// Checks on the values inside one XML file.
    #[must_use]
    pub fn check_xml_content(&self, key: &str, xml: &XmlRecord, year: i32) -> Vec<Finding> {
        let mut findings = Vec::new();
        let content = |message: String| Finding::new(FindingKind::ContentCheck, message);

        if xml.subject_id.as_ref().map_or(0, String::len) != self.config.id_length {
            findings.push(content(format!(
                "Error: Sub ID incorrect length in xml file for {key}"
            )));
        }

        let dob_year = xml.dob.as_deref().and_then(parse_year);
        if dob_year.map_or(true, |y| y > self.config.latest_dob_year) {
            findings.push(content(format!("Error: Check DOB in xml file for {key}")));
        }

        let test_year = xml.test_date.as_deref().and_then(parse_year);
        if test_year != Some(year) {
            findings.push(content(format!(
                "Error: Check test date in xml file for {key}"
            )));
        }

        if !starts_uppercase(xml.gender.as_deref()) {
            findings.push(content(format!(
                "Error: Make gender uppercase in xml file for {key}"
            )));
        }
        if !starts_uppercase(xml.hand.as_deref()) {
            findings.push(content(format!(
                "Error: Make handedness uppercase in xml file for {key}"
            )));
        }
        findings
    }

    /// Cross-checks between the XML content, the XML filename and the
    /// result filenames.
    #[must_use]
    pub fn check_xml_against_names(
        &self,
        folder: &NeuroFolder,
        xml_name: &NeuroName,
        xml: &XmlRecord,
    ) -> Vec<Finding> {
        let key = &folder.key;
        let mut findings = Vec::new();

        if xml.subject_id.as_deref() != Some(xml_name.subject_id.as_str()) {
            findings.push(Finding::new(
                FindingKind::IdentityConflict,
                format!("Error: Subject ID inside xml doesn't match ID outside xml for {key}"),
            ));
        }
        if xml.session_code.as_deref() != Some(xml_name.run_letter.as_str()) {
            findings.push(Finding::new(
                FindingKind::IdentityConflict,
                format!(
                    "Error: Run Letter inside xml doesn't match run letter outside xml for {key}"
                ),
            ));
        }

        let sum_runs: BTreeSet<&str> = folder.sum_txt.iter().map(|n| n.run_letter.as_str()).collect();
        let txt_runs: BTreeSet<&str> = folder.txt.iter().map(|n| n.run_letter.as_str()).collect();
        if sum_runs != txt_runs {
            findings.push(Finding::new(
                FindingKind::IdentityConflict,
                format!("Error: Run letter in txt file doesn't match sum.txt file for {key}"),
            ));
        }
        findings
    }

    /// All checks for one subject folder, deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `folder` is missing or not a directory.
    pub fn review_subject(&self, folder: &Path, year: i32) -> Result<Report, ScanError> {
        let parsed = self.parse_folder(folder)?;
        let key = parsed.key.clone();

        let mut section = Section::new(
            "NEUROPSYCH CHECK",
            format!("No errors found in {}", folder.display()),
        );
        for finding in &parsed.malformed {
            section.push(finding.clone());
        }
        for kind in [NeuroKind::Txt, NeuroKind::SumTxt] {
            for finding in self.check_filenames(&parsed, kind) {
                section.push(finding);
            }
        }

        match parsed.xml.as_slice() {
            [] => section.push(
                Finding::new(
                    FindingKind::MalformedName,
                    format!("Error: Missing xml file for {key}"),
                )
                .with_path(folder),
            ),
            [(path, name), rest @ ..] => {
                if !rest.is_empty() {
                    section.push(
                        Finding::new(
                            FindingKind::CountMismatch,
                            format!("Error: More than one xml file for {key}"),
                        )
                        .with_path(folder),
                    );
                }
                match XmlRecord::read(path) {
                    Ok(xml) => {
                        for finding in self.check_xml_content(&key, &xml, year) {
                            section.push(finding);
                        }
                        for finding in self.check_xml_against_names(&parsed, name, &xml) {
                            section.push(finding);
                        }
                    }
                    Err(e) => {
                        log::warn!("Cannot read {}: {}", path.display(), e);
                        section.push(
                            Finding::new(
                                FindingKind::FileOperationFailed,
                                format!("Error: Cannot read xml file for {key}: {e}"),
                            )
                            .with_path(path),
                        );
                    }
                }
            }
        }

        section.dedup();
        let mut report = Report::new(folder.display().to_string());
        report.push(section);
        Ok(report)
    }

    /// Review every subject folder under `root` (or `root` itself when it
    /// has no subfolders). Nested folders abort the review with one
    /// finding per offending folder.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `root` is missing or not a directory.
    pub fn review(&self, root: &Path, year: i32) -> Result<Vec<Report>, ScanError> {
        ensure_dir(root)?;

        let nested = nested_folders(root);
        if !nested.is_empty() {
            let mut report = Report::new(root.display().to_string());
            report.push(Section::new("NESTED FOLDERS", "").with_findings(nested));
            return Ok(vec![report]);
        }

        let subjects = child_dirs(root)?;
        if subjects.is_empty() {
            return Ok(vec![self.review_subject(root, year)?]);
        }
        subjects
            .iter()
            .map(|s| self.review_subject(s, year))
            .collect()
    }

    /// One row per XML file under `root`, sorted by test date. Files that
    /// cannot be read become findings.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when `root` is missing or not a directory.
    pub fn xml_table(&self, root: &Path) -> Result<(Vec<XmlRow>, Vec<Finding>), ScanError> {
        ensure_dir(root)?;
        let mut rows = Vec::new();
        let mut findings = Vec::new();

        for path in Walker::new(root, WalkerConfig::default()).files() {
            if path.extension().map_or(true, |e| e != "xml") {
                continue;
            }
            match XmlRecord::read(&path) {
                Ok(xml) => rows.push(XmlRow {
                    subject_id: xml.subject_id.unwrap_or_default(),
                    test_date: xml.test_date.unwrap_or_default(),
                    dob: xml.dob.unwrap_or_default(),
                    gender: xml.gender.unwrap_or_default(),
                    handedness: xml.hand.unwrap_or_default(),
                    run_letter: xml.session_code.unwrap_or_default(),
                    path,
                }),
                Err(e) => findings.push(
                    Finding::new(FindingKind::FileOperationFailed, format!("Cannot read {}: {e}", path.display()))
                        .with_path(&path),
                ),
            }
        }

        log::info!("sorting by test date...");
        rows.sort_by_key(|row| (parse_date(&row.test_date).is_none(), parse_date(&row.test_date)));
        Ok((rows, findings))
    }
}

/// Subject folders under `root` that contain a folder of their own.
#[must_use]
pub fn nested_folders(root: &Path) -> Vec<Finding> {
    let parents: BTreeSet<PathBuf> = all_subdirs(root)
        .into_iter()
        .filter_map(|dir| dir.parent().map(Path::to_path_buf))
        .filter(|parent| parent != root)
        .collect();

    parents
        .into_iter()
        .map(|p| {
            Finding::new(
                FindingKind::NestedFolder,
                format!(
                    "ERROR: {} erroneously has a folder within it -- Please move or remove & run check again.",
                    p.display()
                ),
            )
            .with_path(&p)
        })
        .collect()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn parse_year(value: &str) -> Option<i32> {
    parse_date(value)
        .map(|d| d.year())
        .or_else(|| value.trim().rsplit('/').next()?.parse().ok())
}

fn starts_uppercase(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.chars().next())
        .is_some_and(char::is_uppercase)
}
