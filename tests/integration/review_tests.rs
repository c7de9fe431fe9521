//! End-to-end review of ERP session folders.

use labqc::config::{Config, ExpectationTable};
use labqc::classify::{Category, Classifier};
use labqc::report::{FindingKind, Report};
use labqc::validate::Validator;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), name.as_bytes()).unwrap();
}

fn cpt_only_validator() -> Validator {
    let mut table = ExpectationTable::empty();
    table.set_count("cpt", Category::Avg, 6);
    table.set_version("cpt", "4");
    Validator::new(table, Classifier::erp())
}

fn section_problems(report: &Report, title: &str) -> usize {
    report
        .sections
        .iter()
        .find(|s| s.title == title)
        .map(|s| s.findings.iter().filter(|f| f.kind.is_problem()).count())
        .unwrap_or_default()
}

#[test]
fn test_review_counts_five_of_six() {
    let dir = TempDir::new().unwrap();
    for n in 1..=5 {
        touch(dir.path(), &format!("cpt_4_a1_40001001_{n}.avg"));
    }

    let report = cpt_only_validator().review_folder(dir.path()).unwrap();
    let counts = report.of_kind(FindingKind::CountMismatch);
    assert_eq!(counts.len(), 1);
    assert!(counts[0].message.starts_with("Incorrect number of cpt avg files in"));

    touch(dir.path(), "cpt_4_a1_40001001_6.avg");
    let report = cpt_only_validator().review_folder(dir.path()).unwrap();
    assert!(report.of_kind(FindingKind::CountMismatch).is_empty());
    assert_eq!(report.problem_count(), 0);
}

#[test]
fn test_review_flags_versions_strays_and_identity() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "cpt_3_a1_40001001_32.cnt");
    touch(dir.path(), "cpt_4_b1_40001002_32.cnt");
    touch(dir.path(), "session_notes.docx");

    let report = Validator::from_config(&Config::default())
        .review_folder(dir.path())
        .unwrap();

    assert_eq!(section_problems(&report, "ERP VERSION CHECK"), 1);
    assert_eq!(section_problems(&report, "FILES THAT DON'T BELONG"), 1);
    let identity = report.of_kind(FindingKind::IdentityConflict);
    assert_eq!(identity.len(), 2);
    assert!(identity[0].message.contains("more than one sub ID"));
    assert!(identity[1].message.contains("more than one run letter"));
}

#[test]
fn test_review_batch_visits_each_subject_folder() {
    let dir = TempDir::new().unwrap();
    for subject in ["40001001", "40001002", "40001003"] {
        let folder = dir.path().join(subject);
        fs::create_dir(&folder).unwrap();
        touch(&folder, &format!("cpt_4_a1_{subject}_32.cnt"));
    }

    let validator = cpt_only_validator();
    let reports = validator
        .review_batch(dir.path(), &["40001002".to_string()])
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].subject.ends_with("40001001"));
    assert!(reports[1].subject.ends_with("40001003"));
}

#[test]
fn test_review_missing_folder_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(cpt_only_validator().review_folder(&missing).is_err());
}
