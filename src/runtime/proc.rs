//! Child process execution.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use super::RealRuntime;

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Exit code, or None if terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_impl(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run '{}'", program))?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn run_interactive_impl(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<Option<i32>> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to run '{}'", program))?;
        Ok(status.code())
    }
}
