//! Migration of new site data into an archive folder.

use labqc::actions::{check_site_target, MigrateError, MigrationPlan, Migrator};
use labqc::error::ExitCode;
use labqc::report::FindingKind;
use labqc::site::{Site, SiteError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    new_data: PathBuf,
    target: PathBuf,
}

fn fixture(files: &[(&str, &[u8])]) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let new_data = tmp.path().join("neuropsych_new");
    let target = tmp.path().join("suny");
    fs::create_dir_all(&target).unwrap();
    for (rel, content) in files {
        let path = new_data.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    Fixture {
        _tmp: tmp,
        new_data,
        target,
    }
}

fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = walk(root)
        .into_iter()
        .map(|p| {
            let content = fs::read(&p).unwrap();
            (p.strip_prefix(root).unwrap().to_path_buf(), content)
        })
        .collect();
    files.sort();
    files
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

#[test]
fn test_migration_is_idempotent() {
    let fx = fixture(&[
        ("40001001/40001001_TOLT_a_1_sum.txt", b"tolt"),
        ("40001001/40001001_CBST_a_1_sum.txt", b"cbst"),
        ("40001001/40001001_a.xml", b"<xml/>"),
        ("40002001/40002001_a.xml", b"<xml2/>"),
    ]);
    assert_eq!(check_site_target(&fx.new_data, &fx.target).unwrap(), Site::Suny);

    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    assert_eq!(plan.to_create.len(), 2);
    let first = Migrator::new().run(&plan);
    assert_eq!(first.written.len(), 4);
    assert_eq!(first.created_dirs.len(), 2);
    let after_first = tree(&fx.target);

    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    assert!(plan.to_create.is_empty());
    let second = Migrator::new().run(&plan);
    assert!(second.written.is_empty());
    assert_eq!(second.bytes_copied, 0);
    assert_eq!(tree(&fx.target), after_first);
    assert!(second
        .findings
        .iter()
        .all(|f| f.kind == FindingKind::DestinationCollision));
    assert_eq!(ExitCode::for_reports(&[second.report()]), ExitCode::FindingsReported);
}

#[test]
fn test_rerun_renamed_when_canonical_absent() {
    let fx = fixture(&[("40001001/40001001_TOLT_a_1_sum_rr.txt", b"rerun")]);
    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    let summary = Migrator::new().run(&plan);

    let dest = fx.target.join("40001001");
    assert_eq!(fs::read(dest.join("40001001_TOLT_a_1_sum.txt")).unwrap(), b"rerun");
    assert!(!dest.join("40001001_TOLT_a_1_sum_rr.txt").exists());
    assert!(summary.all_succeeded());

    // A second run sees the renamed file holding the same content.
    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    let again = Migrator::new().run(&plan);
    assert!(again.written.is_empty());
    assert_eq!(again.report().problem_count(), 0);
}

#[test]
fn test_rerun_kept_verbatim_when_canonical_present() {
    let fx = fixture(&[("40001001/40001001_TOLT_a_1_sum_rr.txt", b"rerun")]);
    let dest = fx.target.join("40001001");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("40001001_TOLT_a_1_sum.txt"), b"original").unwrap();

    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    let summary = Migrator::new().run(&plan);

    assert_eq!(fs::read(dest.join("40001001_TOLT_a_1_sum.txt")).unwrap(), b"original");
    assert_eq!(fs::read(dest.join("40001001_TOLT_a_1_sum_rr.txt")).unwrap(), b"rerun");
    let report = summary.report();
    assert_eq!(report.of_kind(FindingKind::ManualRename).len(), 1);
}

#[test]
fn test_inconsistent_plan_writes_nothing() {
    let fx = fixture(&[
        ("40001001/40001001_a.xml", b"a"),
        ("40001002/40001001_b.xml", b"misfiled"),
    ]);
    let err = MigrationPlan::build(&fx.new_data, &fx.target).unwrap_err();
    assert!(matches!(err, MigrateError::Inconsistent { .. }));
    assert!(tree(&fx.target).is_empty());
    assert!(!fx.target.join("40001001").exists());
}

#[test]
fn test_site_mismatch_aborts_before_planning() {
    let fx = fixture(&[("30001001/30001001_a.xml", b"iowa")]);
    let err = check_site_target(&fx.new_data, &fx.target).unwrap_err();
    assert!(matches!(err, MigrateError::Site(SiteError::Mismatch { .. })));
}

#[test]
fn test_dry_run_plan_report_lists_copies() {
    let fx = fixture(&[("40001001/40001001_a.xml", b"a")]);
    let plan = MigrationPlan::build(&fx.new_data, &fx.target).unwrap();
    let report = plan.report();
    assert_eq!(report.problem_count(), 0);
    let messages: Vec<_> = report.findings().map(|f| f.message.clone()).collect();
    assert!(messages[0].starts_with("Would create"));
    assert!(messages[1].contains("40001001_a.xml ->"));
    assert!(!fx.target.join("40001001").exists());
}
