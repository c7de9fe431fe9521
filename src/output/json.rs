//! JSON output for reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "reports": [
//!     {
//!       "subject": "40001001",
//!       "sections": [
//!         {
//!           "title": "ERP VERSION CHECK",
//!           "pass_message": "All versions check out!",
//!           "findings": [
//!             { "kind": "VersionMismatch", "message": "...", "path": null }
//!           ]
//!         }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "reports": 1,
//!     "problems": 1,
//!     "by_kind": { "VersionMismatch": 1 },
//!     "exit_code": 2,
//!     "exit_code_name": "LQ002"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;
use crate::report::{FindingKind, Report};

/// Counts over every report in the output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub reports: usize,
    /// Findings that are problems (notes excluded).
    pub problems: usize,
    pub by_kind: BTreeMap<FindingKind, usize>,
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "LQ002")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    pub reports: &'a [Report],
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(reports: &'a [Report], exit_code: ExitCode) -> Self {
        let mut by_kind = BTreeMap::new();
        for finding in reports.iter().flat_map(Report::findings) {
            *by_kind.entry(finding.kind).or_insert(0) += 1;
        }
        Self {
            reports,
            summary: JsonSummary {
                reports: reports.len(),
                problems: reports.iter().map(Report::problem_count).sum(),
                by_kind,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
