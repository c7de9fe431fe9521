//! labqc - data-quality checks and archive migration for lab recordings
//!
//! Reviews ERP session folders (versions, counts, identity, strays,
//! duplicates), checks neuropsych and peak-pick data, and copies new site
//! data into the canonical archive without ever overwriting a file.

pub mod actions;
pub mod classify;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod site;
pub mod validate;

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{
    check_site_target, move_peaks, CommandTool, MigrationPlan, Migrator, StageOptions, Stager,
};
use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::duplicates::{dedup_report, DuplicateFinder};
use crate::error::ExitCode;
use crate::output::{write_xml_table, CsvOutput, JsonOutput, SessionLog, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::report::{Report, Section};
use crate::scanner::WalkerConfig;
use crate::validate::{check_archive, check_picks, NeuroChecker, StrayDetector, Validator, XmlRow};

/// What a command produced.
enum Outcome {
    Reports(Vec<Report>),
    XmlTable(Vec<XmlRow>, Report),
}

impl Outcome {
    fn reports(&self) -> &[Report] {
        match self {
            Outcome::Reports(reports) => reports,
            Outcome::XmlTable(_, report) => std::slice::from_ref(report),
        }
    }
}

/// Run one parsed command line and return the process exit code.
///
/// # Errors
///
/// Whole-operation failures (missing paths, bad configuration, site
/// mismatches, inconsistent migration plans). Per-file problems are
/// reported as findings and only affect the exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref())?;
    let show_progress = cli.output == OutputFormat::Text && !cli.quiet;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    log::debug!("Running {}", cli.command.name());
    let outcome = dispatch(&cli.command, &config, progress)?;
    let exit_code = ExitCode::for_reports(outcome.reports());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(&outcome, cli.output, exit_code, &mut out)?;
    out.flush()?;

    if let Some(dir) = &cli.log_dir {
        let mut session = SessionLog::new(dir, cli.command.name(), chrono::Local::now());
        session
            .append(&TextOutput::new(outcome.reports()).plain())
            .with_context(|| format!("Cannot write session log {}", session.path().display()))?;
        log::info!("Session log: {}", session.path().display());
    }

    Ok(exit_code)
}

fn dispatch(command: &Commands, config: &Config, progress: Arc<dyn ProgressCallback>) -> Result<Outcome> {
    let reports = match command {
        Commands::Review(args) => {
            let validator = Validator::from_config(config);
            let mut reports = validator.review_batch(&args.path, &args.exclude)?;
            reports.push(dedup(&args.path, progress)?);
            reports
        }
        Commands::Dedup(args) => vec![dedup(&args.path, progress)?],
        Commands::Strays(args) => {
            let detector = StrayDetector::new(config.strays.allowed_suffixes.clone());
            let strays = detector.detect(&args.path)?;
            let mut report = Report::new(args.path.display().to_string());
            report.push(
                Section::new("FILES THAT DON'T BELONG", "No wild files found!")
                    .with_findings(StrayDetector::findings(&strays)),
            );
            vec![report]
        }
        Commands::Migrate(args) => {
            let site = check_site_target(&args.new_data, &args.target)?;
            log::info!("Migrating {} data for site {}", args.new_data.display(), site);
            let plan = MigrationPlan::build(&args.new_data, &args.target)?;
            if args.dry_run {
                vec![plan.report()]
            } else {
                let summary = Migrator::new().with_progress_callback(progress).run(&plan);
                vec![summary.report()]
            }
        }
        Commands::MovePeaks(args) => {
            let summary = move_peaks(&args.path, args.site, &config.peaks)?;
            vec![summary.report(&args.path)]
        }
        Commands::NeuroReview(args) => {
            NeuroChecker::new(config.neuro.clone()).review(&args.path, args.year)?
        }
        Commands::NeuroTable(args) => {
            let (rows, findings) = NeuroChecker::new(config.neuro.clone()).xml_table(&args.path)?;
            let mut report = Report::new(args.path.display().to_string());
            report.push(
                Section::new(
                    "XML TABLE",
                    format!("{} XML file(s) tabulated", rows.len()),
                )
                .with_findings(findings),
            );
            return Ok(Outcome::XmlTable(rows, report));
        }
        Commands::CheckArchive(args) => {
            vec![check_archive(&args.new_data, &args.archive, args.site)?]
        }
        Commands::CheckPicks(args) => vec![check_picks(&args.path, &config.peaks)?],
        Commands::StageH1(args) => {
            let options = StageOptions {
                experiments: args.experiments.iter().cloned().collect::<BTreeSet<_>>(),
                plot: args.plot,
                keep_intermediate: args.keep_intermediate,
                exclude: args.exclude.clone(),
            };
            let tool = CommandTool;
            let stager = Stager::new(&config.tools, &tool);
            vec![stager.stage_h1(&args.path, &args.target, &options)?]
        }
        Commands::RawCheck(args) => {
            let tool = CommandTool;
            Stager::new(&config.tools, &tool).raw_check(&args.path)?
        }
    };
    Ok(Outcome::Reports(reports))
}

fn dedup(root: &Path, progress: Arc<dyn ProgressCallback>) -> Result<Report> {
    let finder = DuplicateFinder::new(WalkerConfig::default()).with_progress_callback(progress);
    let (groups, summary) = finder.find_duplicates(root)?;
    Ok(dedup_report(root, &groups, &summary))
}

fn emit<W: Write>(outcome: &Outcome, format: OutputFormat, exit_code: ExitCode, out: &mut W) -> Result<()> {
    match (outcome, format) {
        (Outcome::XmlTable(rows, report), OutputFormat::Json) => {
            let value = serde_json::json!({
                "rows": rows,
                "report": JsonOutput::new(std::slice::from_ref(report), exit_code),
            });
            serde_json::to_writer_pretty(&mut *out, &value)?;
            writeln!(out)?;
        }
        (Outcome::XmlTable(rows, report), _) => {
            write_xml_table(rows, &mut *out)?;
            if format == OutputFormat::Text && !report.sections.iter().all(Section::passed) {
                TextOutput::new(std::slice::from_ref(report)).write_to(out)?;
            }
        }
        (Outcome::Reports(reports), OutputFormat::Text) => {
            TextOutput::new(reports).write_to(out)?;
        }
        (Outcome::Reports(reports), OutputFormat::Json) => {
            JsonOutput::new(reports, exit_code).write_to(out, true)?;
        }
        (Outcome::Reports(reports), OutputFormat::Csv) => {
            CsvOutput::new(reports).write_to(out)?;
        }
    }
    Ok(())
}
