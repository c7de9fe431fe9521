//! Append-only session log.
//!
//! One file per session, named `<prefix>_<YYYY-MM-DD_HH-MM>.log`. Every
//! command's plain-text output is appended under a banner holding the run
//! counter.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

const BANNER_WIDTH: usize = 70;

#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    count: usize,
}

impl SessionLog {
    /// Log file in `dir` stamped with `started`.
    #[must_use]
    pub fn new(dir: &Path, prefix: &str, started: DateTime<Local>) -> Self {
        let name = format!("{}_{}.log", prefix, started.format("%Y-%m-%d_%H-%M"));
        Self {
            path: dir.join(name),
            count: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one run's output.
    ///
    /// # Errors
    ///
    /// Returns the error from creating the directory or writing the file.
    pub fn append(&mut self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let banner = "*".repeat(BANNER_WIDTH);
        if self.count == 0 {
            // Resume numbering when another run in the same minute already wrote here.
            if let Ok(existing) = fs::read_to_string(&self.path) {
                self.count = existing.matches(&format!("{banner}\n\n")).count();
            }
        }
        self.count += 1;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "\n\n{banner}\n{}\n{banner}\n\n", self.count)?;
        file.write_all(text.as_bytes())?;
        log::debug!("Appended run {} to {}", self.count, self.path.display());
        Ok(())
    }
}
