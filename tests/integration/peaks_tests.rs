//! Sorting peak-pick results into accepted and rejected trees.

use labqc::actions::{move_peaks, MigrateError};
use labqc::config::PeaksConfig;
use labqc::report::FindingKind;
use labqc::site::Site;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_all(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

#[test]
fn test_complete_subject_accepted_partial_rejected() {
    let tmp = TempDir::new().unwrap();
    let picked = tmp.path().join("picked");
    write_all(
        &picked.join("vp3"),
        &[
            "vp3_6_e1_40001001_avg.h1",
            "vp3_6_e1_40001001_avg.mt",
            "vp3_6_e1_40001001_avg.pdf",
            "vp3_6_e1_40001002_avg.h1",
            "vp3_6_e1_40001002_avg.mt",
            "vp3_6_e1_40001002_avg.log",
        ],
    );
    let config = PeaksConfig {
        root: tmp.path().join("archive"),
        ..PeaksConfig::default()
    };

    let summary = move_peaks(&picked, Site::Suny, &config).unwrap();
    assert_eq!(summary.accepted.len(), 1);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(
        summary.summary(),
        "Total of 1 subs accepted.\nTotal of 1 subs rejected."
    );

    let accepted = config.accepted_dir("vp3", Site::Suny);
    let rejected = config.rejected_dir("vp3", Site::Suny);
    assert!(accepted.join("vp3_6_e1_40001001_avg.pdf").exists());
    assert!(rejected.join("vp3_6_e1_40001002_avg.mt").exists());
    assert!(!rejected.join("vp3_6_e1_40001002_avg.log").exists());

    // Nothing is overwritten on a second pass.
    let again = move_peaks(&picked, Site::Suny, &config).unwrap();
    assert!(again.copied.is_empty());
    assert_eq!(
        again.report(&picked).of_kind(FindingKind::DestinationCollision).len(),
        5
    );
}

#[test]
fn test_foreign_subject_aborts_before_copying() {
    let tmp = TempDir::new().unwrap();
    let picked = tmp.path().join("picked");
    write_all(
        &picked.join("aod"),
        &[
            "aod_7_a1_40001001_avg.h1",
            "aod_7_a1_50001001_avg.h1",
        ],
    );
    let config = PeaksConfig {
        root: tmp.path().join("archive"),
        ..PeaksConfig::default()
    };

    let err = move_peaks(&picked, Site::Suny, &config).unwrap_err();
    assert!(matches!(err, MigrateError::Site(_)));
    assert!(!tmp.path().join("archive").exists());
}
