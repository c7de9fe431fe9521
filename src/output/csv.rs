//! CSV output: one row per finding, and the neuropsych XML table.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::report::{FindingKind, Report};
use crate::validate::XmlRow;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    subject: &'a str,
    section: &'a str,
    kind: FindingKind,
    message: &'a str,
    path: String,
}

/// Writes every finding of every report.
pub struct CsvOutput<'a> {
    reports: &'a [Report],
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(reports: &'a [Report]) -> Self {
        Self { reports }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for report in self.reports {
            for section in &report.sections {
                for finding in &section.findings {
                    csv_writer.serialize(CsvRow {
                        subject: &report.subject,
                        section: &section.title,
                        kind: finding.kind,
                        message: &finding.message,
                        path: finding
                            .path
                            .as_ref()
                            .map(|p| p.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    })?;
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Write the XML summary table with its display headers.
///
/// # Errors
///
/// Returns `CsvOutputError` if writing or serialization fails.
pub fn write_xml_table<W: io::Write>(rows: &[XmlRow], writer: W) -> Result<(), CsvOutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
