//! Run action - resolves a typed command name against the registry and
//! executes the matching script as a child process.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, warn};

use crate::archive::{SCRIPT_EXT, SHELL_EXT};
use crate::ops::OpReport;
use crate::runtime::Runtime;
use crate::store::{Registry, StateStore};

pub struct RunAction<'a, R: Runtime> {
    runtime: &'a R,
    store: StateStore<'a, R>,
}

/// Find the first recorded command whose file stem matches `command`.
/// Registry order is insertion order, so when two packages ship the same
/// stem, the package installed first wins.
pub fn resolve(registry: &Registry, command: &str) -> Option<PathBuf> {
    for (name, record) in registry.iter() {
        let Some(manifest) = record.as_manifest() else {
            continue;
        };
        for entry in &manifest.commands {
            let path = Path::new(entry);
            if path.file_stem().is_some_and(|stem| stem == command) {
                debug!("Resolved command {} to {} (package {})", command, entry, name);
                return Some(path.to_path_buf());
            }
        }
    }
    None
}

impl<'a, R: Runtime> RunAction<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runtime,
            store: StateStore::new(runtime, root.into()),
        }
    }

    /// Resolve `command` and run it. Returns Ok(None) when no installed
    /// package provides the command; otherwise a report reflecting the
    /// child's exit. Scripts always run as child processes, never in
    /// this process.
    pub fn resolve_and_run(&self, command: &str) -> Result<Option<OpReport>> {
        let registry = self.store.load_registry()?;
        let Some(path) = resolve(&registry, command) else {
            return Ok(None);
        };

        let interpreter = match path.extension().and_then(|e| e.to_str()) {
            Some(SCRIPT_EXT) => "python3",
            Some(SHELL_EXT) => "bash",
            _ => {
                warn!("Unrecognized command artifact: {}", path.display());
                return Ok(None);
            }
        };

        let args = vec![path.to_string_lossy().into_owned()];
        let code = self.runtime.run_interactive(interpreter, &args)?;
        match code {
            Some(0) => Ok(Some(OpReport::success(String::new()))),
            Some(code) => Ok(Some(OpReport::failed(format!(
                "Command {} exited with code {}.",
                command, code
            )))),
            None => Ok(Some(OpReport::failed(format!(
                "Command {} was terminated by a signal.",
                command
            )))),
        }
    }
}
