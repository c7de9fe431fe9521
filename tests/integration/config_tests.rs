//! Layered configuration: defaults, TOML file and `LABQC_*` variables.

use labqc::classify::Category;
use labqc::config::Config;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("LABQC_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let config = Config::default();
    assert_eq!(config.neuro.id_length, 8);
    assert_eq!(config.peaks.extensions, vec!["h1", "mt", "pdf"]);
    assert!(config.classifier.second_run_enabled);
    assert_eq!(
        config.expectations.get("cpt").unwrap().counts[&Category::Avg],
        6
    );
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[neuro]
experiments = ["TOLT", "CBST", "SSRT"]
latest_dob_year = 2012

[classifier]
second_run_enabled = false

[peaks]
extensions = ["h1", "mt"]
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.neuro.experiments, vec!["TOLT", "CBST", "SSRT"]);
    assert_eq!(config.neuro.latest_dob_year, 2012);
    assert_eq!(config.neuro.id_length, 8);
    assert!(!config.classifier.second_run_enabled);
    assert_eq!(config.peaks.extensions, vec!["h1", "mt"]);
    assert_eq!(config.strays.allowed_suffixes, Config::default().strays.allowed_suffixes);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[neuro]\nid_length = 7\nfiles_per_extension = 3\n").unwrap();

    std::env::set_var("LABQC_NEURO__ID_LENGTH", "9");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.neuro.id_length, 9);
    assert_eq!(config.neuro.files_per_extension, 3);
}

#[test]
fn test_invalid_value_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[neuro]\nid_length = \"eight\"\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration"));
}

#[test]
fn test_expectation_override_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[expectations.cpt]\nversion = \"5\"\n\n[expectations.cpt.counts]\navg = 7\n",
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    let cpt = config.expectations.get("cpt").unwrap();
    assert_eq!(cpt.version.as_deref(), Some("5"));
    assert_eq!(cpt.counts[&Category::Avg], 7);
}
