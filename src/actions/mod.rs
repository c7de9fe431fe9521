//! Filesystem-mutating operations.
//!
//! Everything here copies; nothing deletes source data. Destinations are
//! never overwritten.
//!
//! - [`copy`]: no-overwrite copy, rename and directory creation
//! - [`rerun`]: placing one file with the `_rr` rerun rule
//! - [`migrate`]: new site data into the canonical archive
//! - [`peaks`]: peak-pick results into accepted/rejected trees
//! - [`tool`]: external program seam
//! - [`stage`]: `.cnt` staging and h1 conversion, raw-data shell checks

pub mod copy;
pub mod migrate;
pub mod peaks;
pub mod rerun;
pub mod stage;
pub mod tool;

pub use copy::{copy_new, ensure_dir_created, rename_new, CopyError};
pub use migrate::{
    check_site_target, MigrateError, MigrationPlan, MigrationSummary, Migrator, PlannedCopy,
};
pub use peaks::{move_peaks, PeakMoveSummary, PeakName, Verdict};
pub use rerun::{place_file, Placement};
pub use stage::{StageOptions, Stager};
pub use tool::{CommandTool, ExternalTool, ToolError, ToolOutput};
