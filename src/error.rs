//! Structured error handling and exit codes.

use serde::Serialize;

use crate::report::Report;

/// Exit codes for the labqc binary.
///
/// - 0: Success (checks ran, nothing to report)
/// - 1: General error (a precondition failed or the run aborted)
/// - 2: Findings reported (checks ran and found problems)
/// - 3: Partial success (some files could not be copied or read)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    FindingsReported = 2,
    PartialSuccess = 3,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LQ000",
            Self::GeneralError => "LQ001",
            Self::FindingsReported => "LQ002",
            Self::PartialSuccess => "LQ003",
        }
    }

    /// Exit code for a finished run.
    ///
    /// Filesystem failures outrank other findings.
    #[must_use]
    pub fn for_reports(reports: &[Report]) -> Self {
        let findings = || reports.iter().flat_map(Report::findings);
        if findings().any(|f| f.kind == crate::report::FindingKind::FileOperationFailed) {
            Self::PartialSuccess
        } else if findings().any(|f| f.kind.is_problem()) {
            Self::FindingsReported
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LQ001")
    pub code: String,
    pub exit_code: i32,
    /// Human-readable error message, outermost context first.
    pub message: String,
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Finding, FindingKind, Section};

    fn report_with(kind: FindingKind) -> Report {
        let mut section = Section::new("T", "ok");
        section.push(Finding::new(kind, "x"));
        let mut report = Report::new("r");
        report.push(section);
        report
    }

    #[test]
    fn test_exit_code_for_reports() {
        assert_eq!(ExitCode::for_reports(&[]), ExitCode::Success);
        assert_eq!(
            ExitCode::for_reports(&[report_with(FindingKind::Note)]),
            ExitCode::Success
        );
        assert_eq!(
            ExitCode::for_reports(&[report_with(FindingKind::CountMismatch)]),
            ExitCode::FindingsReported
        );
        assert_eq!(
            ExitCode::for_reports(&[
                report_with(FindingKind::CountMismatch),
                report_with(FindingKind::FileOperationFailed)
            ]),
            ExitCode::PartialSuccess
        );
    }

    #[test]
    fn test_structured_error_chain() {
        let err = anyhow::anyhow!("root cause").context("Migration aborted");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "LQ001");
        assert_eq!(structured.message, "Migration aborted");
        assert_eq!(structured.causes, vec!["root cause".to_string()]);
    }
}
