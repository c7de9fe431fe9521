//! Command-line interface definitions for labqc.
//!
//! Global options (verbosity, colour, output format, config, session log)
//! apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Review every subject folder of a site delivery, skipping two of them
//! labqc review /data/new/suny --exclude 40001001 --exclude 40001002
//!
//! # Copy neuropsych data into the archive for its site
//! labqc migrate /data/new/neuropsych /vol01/raw_data/neuropsych/suny
//!
//! # JSON findings for scripting
//! labqc --output json dedup /data/new/suny
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::site::Site;

/// Quality control and archive migration for lab recordings.
#[derive(Debug, Parser)]
#[command(name = "labqc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress and log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append this run's text output to a session log in DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every ERP check on a folder or on each folder below it
    Review(ReviewArgs),
    /// Report files with identical content
    Dedup(PathArgs),
    /// List files whose names do not end with an allowed suffix
    Strays(PathArgs),
    /// Copy new site data into the canonical archive
    Migrate(MigrateArgs),
    /// Sort peak-pick results into accepted and rejected trees
    MovePeaks(MovePeaksArgs),
    /// Check neuropsych filenames and XML content
    NeuroReview(NeuroReviewArgs),
    /// Tabulate neuropsych XML files by test date
    NeuroTable(PathArgs),
    /// List archive files that also occur in new data
    CheckArchive(CheckArchiveArgs),
    /// Check peak-pick tables (.mt) against the expected picks
    CheckPicks(PathArgs),
    /// Copy selected .cnt files to a staging folder and build h1 averages
    StageH1(StageH1Args),
    /// Run the raw-data and file-size check scripts on each folder
    RawCheck(PathArgs),
}

impl Commands {
    /// Name used for the session log file.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Review(_) => "review",
            Self::Dedup(_) => "dedup",
            Self::Strays(_) => "strays",
            Self::Migrate(_) => "migrate",
            Self::MovePeaks(_) => "move-peaks",
            Self::NeuroReview(_) => "neuro-review",
            Self::NeuroTable(_) => "neuro-table",
            Self::CheckArchive(_) => "check-archive",
            Self::CheckPicks(_) => "check-picks",
            Self::StageH1(_) => "stage-h1",
            Self::RawCheck(_) => "raw-check",
        }
    }
}

#[derive(Debug, Args)]
pub struct PathArgs {
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// First-level folder to skip (repeatable)
    #[arg(short, long, value_name = "NAME")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// New data, one folder per subject ID
    #[arg(value_name = "NEW_DATA")]
    pub new_data: PathBuf,

    /// Archive folder for one site; its name must be the site name
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Print the plan without copying
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct MovePeaksArgs {
    /// Folder holding one subfolder per experiment
    #[arg(value_name = "PICKED_ROOT")]
    pub path: PathBuf,

    #[arg(long, value_parser = parse_site)]
    pub site: Site,
}

#[derive(Debug, Args)]
pub struct NeuroReviewArgs {
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Year every test date must fall in
    #[arg(long)]
    pub year: i32,
}

#[derive(Debug, Args)]
pub struct CheckArchiveArgs {
    #[arg(value_name = "NEW_DATA")]
    pub new_data: PathBuf,

    /// Archive root holding one folder per site
    #[arg(long, value_name = "ROOT")]
    pub archive: PathBuf,

    #[arg(long, value_parser = parse_site)]
    pub site: Site,
}

#[derive(Debug, Args)]
pub struct StageH1Args {
    #[arg(value_name = "ROOT")]
    pub path: PathBuf,

    /// Staging folder; one subfolder per experiment is created
    #[arg(long, value_name = "DIR")]
    pub target: PathBuf,

    /// Experiment to stage (repeatable)
    #[arg(long = "exp", value_name = "EXP", required = true)]
    pub experiments: Vec<String>,

    /// Also plot every avg.h1
    #[arg(long)]
    pub plot: bool,

    /// Keep _32.cnt and _cnt.h1 files in the staging folder
    #[arg(long)]
    pub keep_intermediate: bool,

    /// First-level folder to skip (repeatable)
    #[arg(short, long, value_name = "NAME")]
    pub exclude: Vec<String>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Sectioned text, coloured on a terminal
    Text,
    /// JSON for scripting
    Json,
    /// CSV for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a site name (`suny`, `Indiana`, `indy`, ...).
///
/// # Examples
///
/// ```
/// use labqc::cli::parse_site;
/// use labqc::site::Site;
///
/// assert_eq!(parse_site("SUNY").unwrap(), Site::Suny);
/// assert!(parse_site("boston").is_err());
/// ```
pub fn parse_site(s: &str) -> Result<Site, String> {
    s.parse::<Site>().map_err(|e| e.to_string())
}
