//! External program invocation.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("empty command")]
    Empty,

    #[error("{0} not found on PATH")]
    NotFound(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Captured result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can run a command line in a working directory.
pub trait ExternalTool {
    /// Run `command` (program plus leading arguments, whitespace
    /// separated) with `args` appended, inside `cwd`.
    ///
    /// # Errors
    ///
    /// [`ToolError`] when the program cannot be started. A program that
    /// runs and exits non-zero is an `Ok` with `success == false`.
    fn run(&self, command: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ToolError>;
}

/// Runs programs with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTool;

impl ExternalTool for CommandTool {
    fn run(&self, command: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ToolError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(ToolError::Empty)?;

        log::debug!("Running {} {:?} in {}", command, args, cwd.display());
        let output = Command::new(program)
            .args(parts)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ToolError::NotFound(program.to_string())
                } else {
                    ToolError::Spawn {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
