//! Staging `.cnt` recordings for peak picking, and the raw-data shell
//! checks.
//!
//! `stage_h1` copies the selected experiments' `_32.cnt` files into
//! `<target>/<exp>/`, converts them with the external tools and removes
//! the intermediates.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;
use crate::report::{Finding, FindingKind, Report, Section};
use crate::scanner::{folder_key, Hasher, ScanError, Walker, WalkerConfig};
use crate::validate::batch_folders;

use super::copy::{copy_new, ensure_dir_created, CopyError};
use super::rerun::place_file;
use super::tool::{ExternalTool, ToolOutput};

const CNT_SUFFIX: &str = "_32.cnt";
const RERUN_CNT_SUFFIX: &str = "_rr.cnt";
const CNT_H1_SUFFIX: &str = "_cnt.h1";
const AVG_H1_SUFFIX: &str = "avg.h1";

/// Choices for one staging run.
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    pub experiments: BTreeSet<String>,
    /// Also plot every `avg.h1`.
    pub plot: bool,
    /// Keep `_32.cnt` and `_cnt.h1` files in the target.
    pub keep_intermediate: bool,
    /// First-level folders of the root to skip.
    pub exclude: Vec<String>,
}

/// Drives staging with an injected tool runner.
pub struct Stager<'a> {
    tools: &'a ToolsConfig,
    runner: &'a dyn ExternalTool,
    hasher: Hasher,
}

impl<'a> Stager<'a> {
    #[must_use]
    pub fn new(tools: &'a ToolsConfig, runner: &'a dyn ExternalTool) -> Self {
        Self {
            tools,
            runner,
            hasher: Hasher::new(),
        }
    }

    /// Copy, convert and clean up.
    ///
    /// # Errors
    ///
    /// [`ScanError`] when `root` or an excluded name does not exist.
    pub fn stage_h1(
        &self,
        root: &Path,
        target: &Path,
        options: &StageOptions,
    ) -> Result<Report, ScanError> {
        let folders = batch_folders(root, &options.exclude)?;
        let mut report = Report::new(root.display().to_string());

        let mut copy_section = Section::new("COPY CNT FILES", "All cnt files copied");
        let mut exp_dirs = BTreeMap::new();
        for exp in &options.experiments {
            let dir = target.join(exp);
            if let Err(e) = ensure_dir_created(&dir) {
                copy_section.push(copy_failure(&dir, &e));
                continue;
            }
            exp_dirs.insert(exp.clone(), dir);
        }

        let mut seen: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut copied = 0usize;
        for folder in &folders {
            for file in Walker::new(folder, WalkerConfig::shallow()).files() {
                let name = folder_key(&file);
                let tokens: Vec<&str> = name.split('_').collect();
                let Some(dest_dir) = tokens.first().and_then(|exp| exp_dirs.get(*exp)) else {
                    continue;
                };

                if name.ends_with(CNT_SUFFIX) {
                    if let Some(subject) = tokens.get(3) {
                        seen.entry((*subject).to_string())
                            .or_default()
                            .insert(tokens[0].to_string());
                    }
                    match copy_new(&file, &dest_dir.join(&name)) {
                        Ok(_) => copied += 1,
                        Err(CopyError::DestinationExists(dest)) => copy_section.push(
                            Finding::new(
                                FindingKind::DestinationCollision,
                                format!("{} already exists!", dest.display()),
                            )
                            .with_path(&dest),
                        ),
                        Err(e) => copy_section.push(copy_failure(&file, &e)),
                    }
                } else if name.ends_with(RERUN_CNT_SUFFIX) {
                    copy_section.push(Finding::note(format!("Rerun found for {name}")));
                    match place_file(&file, dest_dir, &self.hasher) {
                        Ok(placement) => copy_section.findings.extend(placement.finding(&file)),
                        Err(e) => copy_section.push(copy_failure(&file, &e)),
                    }
                }
            }
        }
        copy_section.push(Finding::note(format!(
            "Copied {copied} cnt files for {} experiment(s)",
            options.experiments.len()
        )));
        report.push(copy_section);

        let mut missing = Section::new("MISSING CNT FILES", "All selected experiments found");
        for (subject, exps) in &seen {
            for exp in options.experiments.difference(exps) {
                missing.push(Finding::new(
                    FindingKind::MissingExperiment,
                    format!("{} cnt file missing for {}", exp.to_uppercase(), subject),
                ));
            }
        }
        report.push(missing);

        let mut tools = Section::new("H1 CONVERSION", "All tools ran cleanly");
        for (exp, dir) in &exp_dirs {
            self.convert_experiment(exp, dir, options.plot, &mut tools);
        }
        report.push(tools);

        if !options.keep_intermediate {
            let mut cleanup = Section::new("REMOVING FILES", "Intermediate files removed");
            for dir in exp_dirs.values() {
                remove_intermediates(dir, &mut cleanup);
            }
            report.push(cleanup);
        }

        Ok(report)
    }

    fn convert_experiment(&self, exp: &str, dir: &Path, plot: bool, section: &mut Section) {
        for cnt in files_ending(dir, CNT_SUFFIX) {
            self.invoke(&self.tools.cnt_to_h1, vec![path_arg(&cnt)], dir, section);
        }

        let filter = self.tools.filter_for(exp);
        for h1 in files_ending(dir, CNT_H1_SUFFIX) {
            let args = vec![
                "-lpfilter".to_string(),
                filter.lowpass.to_string(),
                "-hpfilter".to_string(),
                filter.highpass.to_string(),
                "-thresh".to_string(),
                filter.threshold.to_string(),
                "-baseline_times".to_string(),
                self.tools.baseline[0].to_string(),
                self.tools.baseline[1].to_string(),
                path_arg(&h1),
            ];
            self.invoke(&self.tools.h1_to_avg, args, dir, section);
        }

        if plot {
            for avg in files_ending(dir, AVG_H1_SUFFIX) {
                log::info!("creating ps files.. {}", folder_key(&avg));
                self.invoke(&self.tools.plot, vec![folder_key(&avg)], dir, section);
            }
        }
    }

    fn invoke(&self, command: &str, args: Vec<String>, cwd: &Path, section: &mut Section) {
        match self.runner.run(command, &args, cwd) {
            Ok(output) => section.findings.extend(tool_findings(command, &args, &output)),
            Err(e) => {
                log::warn!("{}", e);
                section.push(Finding::new(FindingKind::ToolFailure, e.to_string()).with_path(cwd));
            }
        }
    }

    /// Run the raw-data and file-size check scripts on every folder.
    ///
    /// # Errors
    ///
    /// [`ScanError`] when `root` does not exist.
    pub fn raw_check(&self, root: &Path) -> Result<Vec<Report>, ScanError> {
        let folders = batch_folders(root, &[])?;
        let mut reports = Vec::with_capacity(folders.len());
        for folder in folders {
            let mut section = Section::new("SHELL CHECKS", "Checks ran");
            for (label, command) in [
                ("ERP CHECK", &self.tools.raw_data_check),
                ("FILE SIZE CHECK", &self.tools.file_size_check),
            ] {
                match self.runner.run(command, &[path_arg(&folder)], &folder) {
                    Ok(output) => {
                        section.push(Finding::note(format!(
                            "{label}: {} {}",
                            folder.display(),
                            output.stdout.trim_end()
                        )));
                        if !output.success {
                            section.push(Finding::new(
                                FindingKind::ToolFailure,
                                format!("{command} exited with {:?}", output.code),
                            ));
                        }
                    }
                    Err(e) => section
                        .push(Finding::new(FindingKind::ToolFailure, e.to_string()).with_path(&folder)),
                }
            }
            let mut report = Report::new(folder.display().to_string());
            report.push(section);
            reports.push(report);
        }
        Ok(reports)
    }
}

fn tool_findings(command: &str, args: &[String], output: &ToolOutput) -> Vec<Finding> {
    let mut findings = Vec::new();
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        findings.push(Finding::note(stderr.to_string()));
    }
    if !output.success {
        findings.push(Finding::new(
            FindingKind::ToolFailure,
            format!("{command} {} exited with {:?}", args.join(" "), output.code),
        ));
    }
    findings
}

fn copy_failure(path: &Path, e: &CopyError) -> Finding {
    log::warn!("{}", e);
    Finding::new(FindingKind::FileOperationFailed, e.to_string()).with_path(path)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn files_ending(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    Walker::new(dir, WalkerConfig::default())
        .files()
        .into_iter()
        .filter(|p| folder_key(p).ends_with(suffix))
        .collect()
}

fn remove_intermediates(dir: &Path, section: &mut Section) {
    for path in Walker::new(dir, WalkerConfig::default()).files() {
        let name = folder_key(&path);
        if !(name.ends_with(CNT_SUFFIX) || name.ends_with(CNT_H1_SUFFIX)) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => log::info!("Removing {}", name),
            Err(e) => section.push(
                Finding::new(
                    FindingKind::FileOperationFailed,
                    format!("Could not remove {name}: {e}"),
                )
                .with_path(&path),
            ),
        }
    }
}
