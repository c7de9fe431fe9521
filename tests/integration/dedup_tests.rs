//! Duplicate-content detection across a delivery tree.

use labqc::duplicates::{dedup_report, duplicate_paths, DuplicateFinder};
use labqc::report::FindingKind;
use labqc::scanner::WalkerConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_two_identical_one_distinct() {
    let dir = TempDir::new().unwrap();
    let s1 = dir.path().join("40001001");
    let s2 = dir.path().join("40001002");
    fs::create_dir(&s1).unwrap();
    fs::create_dir(&s2).unwrap();
    fs::write(s1.join("vp3_6_a1_40001001_32.cnt"), b"recording").unwrap();
    fs::write(s2.join("vp3_6_a1_40001002_32.cnt"), b"recording").unwrap();
    fs::write(s2.join("cpt_4_a1_40001002_32.cnt"), b"different recording").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_files, 1);

    let paths = duplicate_paths(&groups);
    assert_eq!(
        paths,
        vec![
            s1.join("vp3_6_a1_40001001_32.cnt"),
            s2.join("vp3_6_a1_40001002_32.cnt")
        ]
    );

    let report = dedup_report(dir.path(), &groups, &summary);
    let findings = report.of_kind(FindingKind::DuplicateContent);
    assert_eq!(findings.len(), 3);
    assert_eq!(findings[0].message, "Error: Identical files found:");
    assert!(findings[1].message.starts_with("Filename: "));
    assert!(findings[1].message.contains(&format!("\nChecksum: {}", groups[0].hash_hex())));
}

#[test]
fn test_one_byte_difference_is_not_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let s1 = dir.path().join("40001001");
    let s2 = dir.path().join("40001002");
    fs::create_dir(&s1).unwrap();
    fs::create_dir(&s2).unwrap();
    fs::write(s1.join("vp3_6_a1_40001001_32.cnt"), b"recording").unwrap();
    fs::write(s2.join("vp3_6_a1_40001002_32.cnt"), b"recording").unwrap();
    let near = s2.join("ern_9_a1_40001002_32.cnt");
    fs::write(&near, b"recordinh").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_files, 1);
    assert!(!duplicate_paths(&groups).contains(&near));
}

#[test]
fn test_no_duplicates_passes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.avg"), b"a").unwrap();
    fs::write(dir.path().join("b.avg"), b"b").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let report = dedup_report(dir.path(), &groups, &summary);
    assert_eq!(report.problem_count(), 0);
    assert_eq!(report.sections[0].summary_line(), "No duplicates found!");
}

#[test]
fn test_shallow_walk_ignores_nested_copies() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("top.cnt"), b"same").unwrap();
    fs::create_dir(dir.path().join("old")).unwrap();
    fs::write(dir.path().join("old/top.cnt"), b"same").unwrap();

    let (groups, _) = DuplicateFinder::new(WalkerConfig::shallow())
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
}
