//! Whole-command runs through `run_app`.

use clap::Parser;
use labqc::cli::Cli;
use labqc::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["labqc", "--quiet", "--no-color", "--output", "json"];
    argv.extend_from_slice(args);
    labqc::run_app(Cli::try_parse_from(argv).unwrap())
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_dedup_exit_codes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.cnt"), b"one").unwrap();
    fs::write(dir.path().join("b.cnt"), b"two").unwrap();
    assert_eq!(run(&["dedup", arg(dir.path())]).unwrap(), ExitCode::Success);

    fs::write(dir.path().join("c.cnt"), b"one").unwrap();
    assert_eq!(
        run(&["dedup", arg(dir.path())]).unwrap(),
        ExitCode::FindingsReported
    );
}

#[test]
fn test_missing_path_is_general_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing");
    let err = run(&["strays", arg(&missing)]).unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_migrate_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let new_data = dir.path().join("new");
    let target = dir.path().join("suny");
    fs::create_dir_all(new_data.join("40001001")).unwrap();
    fs::create_dir_all(&target).unwrap();
    fs::write(new_data.join("40001001/40001001_a.xml"), b"x").unwrap();

    let code = run(&["migrate", arg(&new_data), arg(&target), "--dry-run"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!target.join("40001001").exists());

    let code = run(&["migrate", arg(&new_data), arg(&target)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(target.join("40001001/40001001_a.xml").exists());
}

#[test]
fn test_migrate_to_wrong_site_fails() {
    let dir = TempDir::new().unwrap();
    let new_data = dir.path().join("new");
    let target = dir.path().join("uconn");
    fs::create_dir_all(new_data.join("40001001")).unwrap();
    fs::create_dir_all(&target).unwrap();

    assert!(run(&["migrate", arg(&new_data), arg(&target)]).is_err());
    assert!(fs::read_dir(&target).unwrap().next().is_none());
}

#[test]
fn test_session_log_written() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("cpt_4_a1_40001001_32.cnt"), b"x").unwrap();
    let logs = dir.path().join("logs");

    run(&["strays", arg(&data), "--log-dir", arg(&logs)]).unwrap();
    let entries: Vec<_> = fs::read_dir(&logs).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("strays_") && name.ends_with(".log"));
    let text = fs::read_to_string(&entries[0]).unwrap();
    assert!(text.contains("[FILES THAT DON'T BELONG]"));
    assert!(text.contains("No wild files found!"));
}

#[test]
fn test_config_file_must_exist_when_given() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = run(&["--config", arg(&missing), "strays", arg(dir.path())]).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
