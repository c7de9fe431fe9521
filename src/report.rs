//! Typed findings and sectioned reports.
//!
//! Every check in the engine produces [`Finding`]s rather than printing.
//! A finding carries a [`FindingKind`] so callers and tests can match on
//! the category, plus the exact human-readable line shown to operators.
//! Findings are grouped into [`Section`]s (one per check category), and
//! sections into a [`Report`] for one folder or one operation.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FindingKind {
    /// A required input or output path does not exist.
    PathNotFound,
    /// A filename (or file line) does not tokenize into the expected shape.
    MalformedName,
    /// Observed count of a category for an experiment differs from expected.
    CountMismatch,
    /// More than one subject ID or run letter in a single folder.
    IdentityConflict,
    /// Embedded version token differs from the expected value.
    VersionMismatch,
    /// Two or more files share a content digest.
    DuplicateContent,
    /// A planned copy or rename target already exists.
    DestinationCollision,
    /// A subject ID's site digit does not match the target site.
    SiteIdentityMismatch,
    /// A file whose suffix is not allowed in the folder.
    StrayFile,
    /// A rerun file was copied under its original name and needs a manual rename.
    ManualRename,
    /// A folder contains a nested folder where none is allowed.
    NestedFolder,
    /// Content inside a metadata file (XML, `.mt`) failed a check.
    ContentCheck,
    /// A selected experiment is missing for a subject.
    MissingExperiment,
    /// A file in new data already exists somewhere in the archive.
    AlreadyInArchive,
    /// A filesystem operation on a single file failed.
    FileOperationFailed,
    /// An external tool reported failure.
    ToolFailure,
    /// Informational line (progress notes, tool output).
    Note,
}

impl FindingKind {
    /// Whether this kind counts against a clean result.
    #[must_use]
    pub fn is_problem(self) -> bool {
        !matches!(self, Self::Note)
    }
}

/// A single human-readable result line with its category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Finding {
    #[must_use]
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Informational note.
    #[must_use]
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Note, message)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Findings for one check category, with the line to show when it passes.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub pass_message: String,
    pub findings: Vec<Finding>,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>, pass_message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pass_message: pass_message.into(),
            findings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// True when no finding in this section is a problem.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(|f| f.kind.is_problem())
    }

    /// The one-line pass/fail summary for this section.
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.passed() {
            self.pass_message.clone()
        } else {
            let problems = self.findings.iter().filter(|f| f.kind.is_problem()).count();
            format!("{}: {} problem(s)", self.title, problems)
        }
    }

    /// Drop repeated findings, keeping first-seen order.
    pub fn dedup(&mut self) {
        let mut seen = BTreeSet::new();
        self.findings.retain(|f| seen.insert(f.clone()));
    }
}

/// All sections produced for one folder or one operation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// The folder or operation this report is about.
    pub subject: String,
    pub sections: Vec<Section>,
}

impl Report {
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Iterate over every finding in every section.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.sections.iter().flat_map(|s| s.findings.iter())
    }

    /// Number of findings that are problems.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.findings().filter(|f| f.kind.is_problem()).count()
    }

    /// Findings of a single kind.
    #[must_use]
    pub fn of_kind(&self, kind: FindingKind) -> Vec<&Finding> {
        self.findings().filter(|f| f.kind == kind).collect()
    }
}
