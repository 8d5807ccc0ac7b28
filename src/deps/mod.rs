//! Dependency installation via the host's external installers.
//!
//! Runtime-level dependencies go through `pip3` with a `pip` fallback;
//! system-level dependencies go through `apt` (under `sudo` unless the
//! process is already privileged). Entries already present on the host or
//! already recorded for the package are filtered out before any installer
//! runs.
//!
//! Per-entry failures are not resolved here: a [`FailurePolicy`] supplied
//! by the caller decides skip-vs-abort, which keeps this module free of
//! interactive input and directly testable.

use anyhow::Result;
use log::{info, warn};

use crate::runtime::Runtime;

/// What to do after a single dependency entry failed to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Leave the entry out of the recorded set and keep going.
    SkipEntry,
    /// Abort the whole installation; the caller rolls back.
    AbortInstall,
}

/// Decides how to react when an entry fails. The interactive
/// implementation asks the user; tests supply scripted policies.
#[cfg_attr(test, mockall::automock)]
pub trait FailurePolicy {
    fn on_failure(&self, name: &str, error: &str) -> Result<FailureAction>;
}

/// Policy that asks the user through the runtime's confirmation prompt.
pub struct PromptPolicy<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> PromptPolicy<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }
}

impl<'a, R: Runtime> FailurePolicy for PromptPolicy<'a, R> {
    fn on_failure(&self, name: &str, error: &str) -> Result<FailureAction> {
        warn!("Error: {} could not be installed because {}.", name, error);
        if self
            .runtime
            .confirm("Do you want to continue installation?")?
        {
            Ok(FailureAction::SkipEntry)
        } else {
            Ok(FailureAction::AbortInstall)
        }
    }
}

/// Policy that logs every failed entry and moves on without asking.
/// Batch reconciliation uses this so one bad dependency cannot stall
/// the whole run.
pub struct SkipPolicy;

impl FailurePolicy for SkipPolicy {
    fn on_failure(&self, name: &str, error: &str) -> Result<FailureAction> {
        warn!("Error: {} could not be installed because {}.", name, error);
        Ok(FailureAction::SkipEntry)
    }
}

/// Result of one dependency installation pass.
#[derive(Debug, Default, PartialEq)]
pub struct InstallRun {
    /// Names successfully installed, in attempt order.
    pub installed: Vec<String>,
    /// Names skipped after a failure (policy said continue).
    pub skipped: Vec<String>,
    /// True if the policy aborted the pass; `installed` holds what had
    /// succeeded up to that point.
    pub aborted: bool,
}

/// Installs dependency lists by shelling out to the host's installers.
pub struct DependencyInstaller<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> DependencyInstaller<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Install runtime-level dependencies: `pip3 install` with a `pip`
    /// fallback on non-zero exit. Entries in `already_present` are never
    /// submitted to an installer.
    pub fn install_runtime(
        &self,
        pending: &[String],
        already_present: &[String],
        policy: &dyn FailurePolicy,
    ) -> Result<InstallRun> {
        let mut run = InstallRun::default();

        for name in pending {
            if already_present.contains(name) {
                info!("Skipping runtime module {} (already installed).", name);
                continue;
            }

            info!("Installing runtime module: {}", name);
            match self.pip_install(name)? {
                Ok(()) => run.installed.push(name.clone()),
                Err(error) => match policy.on_failure(name, &error)? {
                    FailureAction::SkipEntry => {
                        info!("Skipping {} and continuing installation.", name);
                        run.skipped.push(name.clone());
                    }
                    FailureAction::AbortInstall => {
                        run.aborted = true;
                        return Ok(run);
                    }
                },
            }
        }

        Ok(run)
    }

    /// Install system-level dependencies via `apt install -y`, prefixed
    /// with `sudo` when not already privileged. Same contract as
    /// [`install_runtime`](Self::install_runtime).
    pub fn install_system(
        &self,
        pending: &[String],
        already_present: &[String],
        policy: &dyn FailurePolicy,
    ) -> Result<InstallRun> {
        let mut run = InstallRun::default();

        for name in pending {
            if already_present.contains(name) {
                info!("Skipping system package {} (already installed).", name);
                continue;
            }

            info!("Installing system package: {}", name);
            match self.apt_install(name)? {
                Ok(()) => run.installed.push(name.clone()),
                Err(error) => match policy.on_failure(name, &error)? {
                    FailureAction::SkipEntry => {
                        info!("Skipping {} and continuing installation.", name);
                        run.skipped.push(name.clone());
                    }
                    FailureAction::AbortInstall => {
                        run.aborted = true;
                        return Ok(run);
                    }
                },
            }
        }

        Ok(run)
    }

    /// One pip attempt chain. Outer error is a runtime failure (could not
    /// even spawn); inner Err carries the installer's message.
    fn pip_install(&self, name: &str) -> Result<Result<(), String>> {
        let args = vec![
            "install".to_string(),
            "--break-system-packages".to_string(),
            name.to_string(),
        ];

        let output = self.runtime.run_command("pip3", &args)?;
        if output.success() {
            return Ok(Ok(()));
        }

        warn!("pip3 failed. Trying pip...");
        let output = self.runtime.run_command("pip", &args)?;
        if output.success() {
            return Ok(Ok(()));
        }

        Ok(Err(output.stderr.trim().to_string()))
    }

    /// One apt attempt. Runs with inherited stdio so apt (and sudo's
    /// password prompt) can talk to the terminal.
    fn apt_install(&self, name: &str) -> Result<Result<(), String>> {
        let (program, args) = if self.runtime.is_privileged() {
            (
                "apt",
                vec!["install".to_string(), "-y".to_string(), name.to_string()],
            )
        } else {
            (
                "sudo",
                vec![
                    "apt".to_string(),
                    "install".to_string(),
                    "-y".to_string(),
                    name.to_string(),
                ],
            )
        };

        match self.runtime.run_interactive(program, &args)? {
            Some(0) => Ok(Ok(())),
            Some(code) => Ok(Err(format!("the installer exited with code {}", code))),
            None => Ok(Err("the installer was terminated by a signal".to_string())),
        }
    }
}
