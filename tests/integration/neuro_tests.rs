//! Neuropsych batch review, XML table and archive overlap.

use labqc::config::NeuroConfig;
use labqc::output::write_xml_table;
use labqc::report::FindingKind;
use labqc::site::{Site, SiteError};
use labqc::validate::{check_archive, CheckError, NeuroChecker};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn xml_doc(id: &str, run: &str, test_date: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<Session>\n  <SubjectID>{id}</SubjectID>\n  <SessionCode>{run}</SessionCode>\n  <DOB>02/11/1985</DOB>\n  <TestDate>{test_date}</TestDate>\n  <Gender>Female</Gender>\n  <Hand>Left</Hand>\n</Session>\n"
    )
}

fn subject(root: &Path, id: &str, test_date: &str) -> PathBuf {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    for exp in ["TOLT", "CBST"] {
        fs::write(dir.join(format!("{id}_{exp}_3b_a1_sum.txt")), b"sum").unwrap();
        fs::write(dir.join(format!("{id}_{exp}_3b_a1.txt")), b"txt").unwrap();
    }
    fs::write(dir.join(format!("{id}_a.xml")), xml_doc(id, "a", test_date)).unwrap();
    dir
}

#[test]
fn test_batch_review_reports_each_subject() {
    let tmp = TempDir::new().unwrap();
    subject(tmp.path(), "40001001", "06/01/2018");
    subject(tmp.path(), "40001002", "06/01/2017");

    let reports = NeuroChecker::new(NeuroConfig::default())
        .review(tmp.path(), 2018)
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].problem_count(), 0);
    let dates = reports[1].of_kind(FindingKind::ContentCheck);
    assert_eq!(dates.len(), 1);
    assert_eq!(
        dates[0].message,
        "Error: Check test date in xml file for 40001002"
    );
}

#[test]
fn test_xml_table_csv() {
    let tmp = TempDir::new().unwrap();
    subject(tmp.path(), "40001001", "06/01/2018");
    subject(tmp.path(), "40001002", "01/20/2018");

    let (rows, findings) = NeuroChecker::default().xml_table(tmp.path()).unwrap();
    assert!(findings.is_empty());

    let mut out = Vec::new();
    write_xml_table(&rows, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines[0],
        "Subject ID,Test Date,DOB,Gender,Handedness,Run Letter"
    );
    assert!(lines[1].starts_with("40001002,01/20/2018"));
    assert!(lines[2].starts_with("40001001,06/01/2018"));
}

#[test]
fn test_archive_overlap() {
    let tmp = TempDir::new().unwrap();
    let new_data = tmp.path().join("new");
    subject(&new_data, "40001001", "06/01/2018");
    let archive = tmp.path().join("archive");
    let archived = archive.join("suny/40001001");
    fs::create_dir_all(&archived).unwrap();
    fs::write(archived.join("40001001_a.xml"), b"older").unwrap();

    let report = check_archive(&new_data, &archive, Site::Suny).unwrap();
    let overlaps = report.of_kind(FindingKind::AlreadyInArchive);
    assert_eq!(overlaps.len(), 1);
    assert!(overlaps[0].message.ends_with("40001001_a.xml"));
}

#[test]
fn test_archive_wrong_site() {
    let tmp = TempDir::new().unwrap();
    let new_data = tmp.path().join("new");
    subject(&new_data, "40001001", "06/01/2018");
    let archive = tmp.path().join("archive");
    fs::create_dir_all(archive.join("iowa")).unwrap();

    let err = check_archive(&new_data, &archive, Site::Iowa).unwrap_err();
    assert!(matches!(err, CheckError::Site(SiteError::Mismatch { .. })));
}
