//! External process execution.
//!
//! Hooks and the secrets cipher are run through the [`Executor`] trait so the
//! orchestration around them can be tested with a fake.
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use anyhow::{Context, Result};

use crate::resources::error::ResourceError;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (empty for interactive runs).
    pub stdout: String,
    /// Captured standard error (empty for interactive runs).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            ..Self::from(output.status)
        }
    }
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Runs external programs.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `program` in `dir` with inherited standard streams and wait for it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the process cannot be started.
    fn run_interactive(
        &self,
        dir: &Path,
        program: &OsStr,
        args: &[&OsStr],
    ) -> std::io::Result<ExecResult>;

    /// Locate `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// [`Executor`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_interactive(
        &self,
        dir: &Path,
        program: &OsStr,
        args: &[&OsStr],
    ) -> std::io::Result<ExecResult> {
        let status = Command::new(program)
            .args(args)
            .current_dir(dir)
            .status()?;
        Ok(ExecResult::from(status))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Run a command and capture its output. Fails if the command exits non-zero.
///
/// # Errors
///
/// Returns an error if the process cannot be started or reports failure.
pub fn run(program: &str, args: &[&str]) -> Result<ExecResult> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute: {program}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(ResourceError::ExecutionFailed {
            program: program.to_string(),
            exit_code: result.code.unwrap_or(-1),
            stderr: result.stderr.trim().to_string(),
        }
        .into());
    }
    Ok(result)
}
