//! Naming-rule classifier.
//!
//! Turns a filename into a [`FileRecord`]: which semantic buckets it
//! belongs to and which subject/experiment/run/version it encodes.
//!
//! - [`tokenize`]: bounds-checked positional field extraction
//! - [`rules`]: the ERP suffix rule table and the second-run rule
//! - [`neuro`]: neuropsych filename conventions
//!
//! # Example
//!
//! ```
//! use labqc::classify::{Category, Classifier};
//! use std::path::Path;
//!
//! let classifier = Classifier::erp();
//! let record = classifier.classify(Path::new("/data/cpt_4_a1_10001001_32.cnt"));
//! assert_eq!(record.categories(), &[Category::Cnt]);
//! assert_eq!(record.fields().unwrap().subject_id, "10001001");
//! ```

pub mod neuro;
pub mod rules;
pub mod tokenize;

use std::path::{Path, PathBuf};

pub use neuro::{parse_neuro_name, NeuroKind, NeuroName};
pub use rules::{Category, RuleTable, SecondRunRule, SuffixRule};
pub use tokenize::{parse_fields, tokenize, Delimiters, NameError, NameLayout, ParsedName};

/// Marker a rerun file carries just before its extension.
pub const RERUN_MARKER: &str = "_rr";

/// Outcome of classifying one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// At least one rule matched and the name tokenized cleanly.
    Recognized {
        categories: Vec<Category>,
        fields: ParsedName,
    },
    /// A rule matched but the name does not have the expected shape.
    Malformed {
        categories: Vec<Category>,
        error: NameError,
    },
    /// No rule matched.
    Unrecognized,
}

/// One classified file. Built from the filename only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub classification: Classification,
}

impl FileRecord {
    /// Categories this file was placed in; empty when unrecognized.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        match &self.classification {
            Classification::Recognized { categories, .. }
            | Classification::Malformed { categories, .. } => categories,
            Classification::Unrecognized => &[],
        }
    }

    /// Parsed fields, when the name tokenized cleanly.
    #[must_use]
    pub fn fields(&self) -> Option<&ParsedName> {
        match &self.classification {
            Classification::Recognized { fields, .. } => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn name_error(&self) -> Option<&NameError> {
        match &self.classification {
            Classification::Malformed { error, .. } => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        matches!(self.classification, Classification::Recognized { .. })
    }
}

/// Applies a [`RuleTable`] to filenames.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: RuleTable,
}

impl Classifier {
    #[must_use]
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Classifier with the standard ERP rule table.
    #[must_use]
    pub fn erp() -> Self {
        Self::new(RuleTable::erp())
    }

    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Classify a file by its name.
    #[must_use]
    pub fn classify(&self, path: &Path) -> FileRecord {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let classification = self.classify_name(&file_name);

        FileRecord {
            path: path.to_path_buf(),
            file_name,
            classification,
        }
    }

    /// Classify a bare filename.
    #[must_use]
    pub fn classify_name(&self, name: &str) -> Classification {
        let mut categories = Vec::new();
        let mut delimiters = None;

        for rule in self.table.matching(name) {
            delimiters.get_or_insert(rule.delimiters);
            if !categories.contains(&rule.category) {
                categories.push(rule.category);
            }
        }

        if let Some(second_run) = self.table.second_run() {
            if second_run.matches(name) && !categories.contains(&Category::Rerun) {
                categories.push(Category::Rerun);
                delimiters.get_or_insert(Delimiters::Underscore);
            }
        }

        let Some(delimiters) = delimiters else {
            return Classification::Unrecognized;
        };

        match parse_fields(name, delimiters, self.table.layout()) {
            Ok(fields) => Classification::Recognized { categories, fields },
            Err(error) => Classification::Malformed { categories, error },
        }
    }
}

/// Whether the file stem ends with the rerun marker (`x_rr.cnt`).
#[must_use]
pub fn is_rerun_name(name: &str) -> bool {
    canonical_rerun_name(name).is_some()
}

/// The canonical name of a rerun file, i.e. the name without the `_rr`
/// marker: `vp3_6_a1_40001001_32_rr.cnt` → `vp3_6_a1_40001001_32.cnt`.
/// Returns `None` when `name` is not a rerun file.
#[must_use]
pub fn canonical_rerun_name(name: &str) -> Option<String> {
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    let base = stem.strip_suffix(RERUN_MARKER)?;
    if base.is_empty() {
        return None;
    }
    Some(format!("{base}{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_cnt() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("/x/cpt_4_a1_10001001_32.cnt"));
        assert_eq!(record.file_name, "cpt_4_a1_10001001_32.cnt");
        assert_eq!(record.categories(), &[Category::Cnt]);
        let fields = record.fields().unwrap();
        assert_eq!(fields.experiment, "cpt");
        assert_eq!(fields.version, "4");
        assert_eq!(fields.run_letter, 'a');
        assert_eq!(fields.subject_id, "10001001");
    }

    #[test]
    fn test_classify_second_run_is_both_cnt_and_rerun() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("vp3_6_a2_10001001_32.cnt"));
        assert_eq!(record.categories(), &[Category::Cnt, Category::Rerun]);
    }

    #[test]
    fn test_classify_second_run_disabled() {
        let c = Classifier::new(RuleTable::erp().with_second_run(None));
        let record = c.classify(Path::new("vp3_6_a2_10001001_32.cnt"));
        assert_eq!(record.categories(), &[Category::Cnt]);
    }

    #[test]
    fn test_classify_avg_with_uppercase_tail() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("vp3_6_a1_10001001T.avg"));
        assert_eq!(record.categories(), &[Category::Avg]);
        assert_eq!(record.fields().unwrap().subject_id, "10001001");
    }

    #[test]
    fn test_classify_dat() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("ern_9_a1_10001001.dat"));
        assert_eq!(record.categories(), &[Category::Dat]);
        assert_eq!(record.fields().unwrap().experiment, "ern");
    }

    #[test]
    fn test_classify_rr_cnt() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("ant_6_a1_10001001_32_rr.cnt"));
        assert_eq!(record.categories(), &[Category::Rerun]);
        assert!(record.is_recognized());
    }

    #[test]
    fn test_classify_malformed() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("cpt_32.cnt"));
        assert_eq!(record.categories(), &[Category::Cnt]);
        assert!(record.fields().is_none());
        assert!(matches!(
            record.name_error(),
            Some(NameError::TooFewTokens { found: 2, .. })
        ));
    }

    #[test]
    fn test_classify_unrecognized() {
        let c = Classifier::erp();
        let record = c.classify(Path::new("notes.docx"));
        assert_eq!(record.classification, Classification::Unrecognized);
        assert!(record.categories().is_empty());
    }

    #[test]
    fn test_classify_is_idempotent() {
        let c = Classifier::erp();
        let path = Path::new("gng_3_c1_60001001_avg.ps");
        assert_eq!(c.classify(path), c.classify(path));
    }

    #[test]
    fn test_canonical_rerun_name() {
        assert_eq!(
            canonical_rerun_name("vp3_6_a1_40001001_32_rr.cnt").as_deref(),
            Some("vp3_6_a1_40001001_32.cnt")
        );
        assert_eq!(canonical_rerun_name("X_rr.cnt").as_deref(), Some("X.cnt"));
        assert_eq!(canonical_rerun_name("X_rr").as_deref(), Some("X"));
        assert_eq!(canonical_rerun_name("X.cnt"), None);
        assert_eq!(canonical_rerun_name("_rr.cnt"), None);
        assert!(is_rerun_name("a_rr.txt"));
        assert!(!is_rerun_name("a_rrx.txt"));
    }
}
