//! Host inventory: what the machine already has installed, independent of
//! this package manager's own records.
//!
//! Two caches, refreshed by full overwrite from the host's query tools:
//! runtime modules via `pip3 list --format=json`, system packages via
//! `dpkg-query`. The caches may be stale the moment they are written;
//! dependency filtering treats them as a best-effort snapshot. A failing
//! query tool keeps the stale cache and never fails the caller.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::Deserialize;

use crate::runtime::Runtime;
use crate::store::StateStore;

/// Snapshot of the host's installed runtime modules and system packages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostInventory {
    pub runtime_modules: Vec<String>,
    pub system_packages: Vec<String>,
}

impl HostInventory {
    pub fn has_runtime_module(&self, name: &str) -> bool {
        self.runtime_modules.iter().any(|m| m == name)
    }

    pub fn has_system_package(&self, name: &str) -> bool {
        self.system_packages.iter().any(|p| p == name)
    }
}

#[derive(Deserialize, Debug)]
struct PipPackage {
    name: String,
}

/// Query the host's runtime modules via `pip3 list --format=json`.
pub fn query_runtime_modules<R: Runtime>(runtime: &R) -> Result<Vec<String>> {
    let output = runtime
        .run_command("pip3", &["list".into(), "--format=json".into()])
        .context("Failed to run pip3")?;

    if !output.success() {
        return Err(anyhow!(
            "pip3 list exited with {:?}: {}",
            output.code,
            output.stderr.trim()
        ));
    }

    let packages: Vec<PipPackage> =
        serde_json::from_str(&output.stdout).context("Failed to parse pip3 output")?;
    Ok(packages.into_iter().map(|p| p.name).collect())
}

/// Query the host's system packages via `dpkg-query`.
pub fn query_system_packages<R: Runtime>(runtime: &R) -> Result<Vec<String>> {
    let output = runtime
        .run_command(
            "dpkg-query",
            &["-W".into(), "-f=${binary:Package}\n".into()],
        )
        .context("Failed to run dpkg-query")?;

    if !output.success() {
        return Err(anyhow!(
            "dpkg-query exited with {:?}: {}",
            output.code,
            output.stderr.trim()
        ));
    }

    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Load the inventory snapshot from the on-disk caches.
pub fn load<R: Runtime>(store: &StateStore<R>) -> Result<HostInventory> {
    Ok(HostInventory {
        runtime_modules: store.load_runtime_modules()?,
        system_packages: store.load_system_packages()?,
    })
}

/// Refresh both caches from the host's query tools, overwriting the state
/// files. A failing query keeps that cache stale; a failing save is
/// reported. Never returns an error: inventory refresh must not take down
/// the operation that triggered it.
pub fn refresh<R: Runtime>(runtime: &R, store: &StateStore<R>) -> HostInventory {
    let runtime_modules = match query_runtime_modules(runtime) {
        Ok(modules) => {
            if let Err(e) = store.save_runtime_modules(&modules) {
                warn!("Failed to save runtime module cache: {}", e);
            }
            modules
        }
        Err(e) => {
            warn!("Error updating installed modules: {}", e);
            store.load_runtime_modules().unwrap_or_default()
        }
    };

    let system_packages = match query_system_packages(runtime) {
        Ok(packages) => {
            if let Err(e) = store.save_system_packages(&packages) {
                warn!("Failed to save system package cache: {}", e);
            }
            packages
        }
        Err(e) => {
            warn!("Error updating installed system packages: {}", e);
            store.load_system_packages().unwrap_or_default()
        }
    };

    debug!(
        "Host inventory refreshed: {} runtime modules, {} system packages",
        runtime_modules.len(),
        system_packages.len()
    );

    HostInventory {
        runtime_modules,
        system_packages,
    }
}
