//! Human-readable report rendering.
//!
//! Each section prints as a bracketed header, its finding lines, then the
//! section's pass/fail line. Colour comes from `yansi` and is dropped when
//! painting is globally disabled.

use std::fmt::Write as _;
use std::io::{self, Write};

use yansi::Paint;

use crate::report::{FindingKind, Report, Section};

/// Renders reports as text.
pub struct TextOutput<'a> {
    reports: &'a [Report],
    numbered: bool,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(reports: &'a [Report]) -> Self {
        Self {
            reports,
            numbered: reports.len() > 1,
        }
    }

    /// Uncoloured text, as written to the session log.
    #[must_use]
    pub fn plain(&self) -> String {
        self.render(false)
    }

    /// Text with ANSI colour when painting is enabled.
    #[must_use]
    pub fn colored(&self) -> String {
        self.render(true)
    }

    /// Write the coloured rendering.
    ///
    /// # Errors
    ///
    /// Returns the writer's error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.colored().as_bytes())
    }

    fn render(&self, color: bool) -> String {
        let mut out = String::new();
        for (idx, report) in self.reports.iter().enumerate() {
            if self.numbered {
                let _ = writeln!(out, "\n{} || {}", idx + 1, report.subject);
            }
            for section in &report.sections {
                render_section(&mut out, section, color);
            }
        }
        out
    }
}

fn render_section(out: &mut String, section: &Section, color: bool) {
    let header = format!("[{}]", section.title);
    if color {
        let _ = writeln!(out, "\n{}", header.cyan().bold());
    } else {
        let _ = writeln!(out, "\n{header}");
    }

    for finding in &section.findings {
        let line = &finding.message;
        match (color, finding.kind) {
            (true, FindingKind::Note) => {
                let _ = writeln!(out, "{line}");
            }
            (true, FindingKind::ManualRename | FindingKind::DestinationCollision) => {
                let _ = writeln!(out, "{}", line.yellow());
            }
            (true, _) => {
                let _ = writeln!(out, "{}", line.red());
            }
            (false, _) => {
                let _ = writeln!(out, "{line}");
            }
        }
    }

    let summary = section.summary_line();
    match (color, section.passed()) {
        (true, true) => {
            let _ = writeln!(out, "{}", summary.green());
        }
        (true, false) => {
            let _ = writeln!(out, "{}", summary.red().bold());
        }
        (false, _) => {
            let _ = writeln!(out, "{summary}");
        }
    }
}
