//! Update action - reconciles every installed package against upstream.
//!
//! Each package is re-fetched and re-extracted over its existing
//! directory, then only the dependencies that are new since the last
//! run are offered for installation. One bad package never aborts the
//! batch; the report carries an aggregate flag instead.

use anyhow::Result;
use log::{info, warn};

use crate::archive;
use crate::deps::{DependencyInstaller, SkipPolicy};
use crate::host::{self, HostInventory};
use crate::ops::OpReport;
use crate::runtime::Runtime;
use crate::source::Source;
use crate::store::{PackageManifest, StateStore};

pub struct UpdateAction<'a, R: Runtime, S: Source> {
    runtime: &'a R,
    source: &'a S,
    store: StateStore<'a, R>,
}

impl<'a, R: Runtime, S: Source> UpdateAction<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runtime,
            source,
            store: StateStore::new(runtime, root.into()),
        }
    }

    pub async fn update(&self) -> Result<OpReport> {
        let mut registry = self.store.load_registry()?;
        if registry.is_empty() {
            return Ok(OpReport::no_op("No packages installed."));
        }

        info!("Updating all installed packages...");
        let inventory = host::refresh(self.runtime, &self.store);

        let entries: Vec<_> = registry
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();
        let total = entries.len();
        let mut failed = 0usize;

        for (name, record) in entries {
            let Some(manifest) = record.as_manifest() else {
                warn!("Invalid manifest for package '{}'. Skipping...", name);
                failed += 1;
                continue;
            };

            match self.update_one(&name, manifest, &inventory).await {
                Ok(updated) => registry.insert(&name, updated),
                Err(error) => {
                    warn!("{:#}", error);
                    failed += 1;
                }
            }
        }

        self.store.save_registry(&registry)?;
        host::refresh(self.runtime, &self.store);

        if failed == 0 {
            Ok(OpReport::success("All packages updated successfully."))
        } else if failed == total {
            Ok(OpReport::failed(format!(
                "All {} packages failed to update.",
                total
            )))
        } else {
            Ok(OpReport::partial_failure(format!(
                "{} of {} packages failed to update.",
                failed, total
            )))
        }
    }

    /// Refresh one package in place. Any error here leaves the recorded
    /// manifest untouched and only flags the batch.
    async fn update_one(
        &self,
        name: &str,
        manifest: &PackageManifest,
        inventory: &HostInventory,
    ) -> Result<PackageManifest> {
        info!("Updating package: {}", name);

        let payload = self
            .source
            .fetch_archive(name)
            .await
            .map_err(|error| anyhow::anyhow!("Failed to fetch package {}: {}", name, error))?;

        let package_dir = self.store.package_dir(name);
        self.runtime.create_dir_all(&package_dir)?;
        archive::extract(self.runtime, &payload, &package_dir)
            .map_err(|error| anyhow::anyhow!("Error re-extracting package {}: {:#}", name, error))?;

        let mut updated = manifest.clone();
        updated.commands = archive::discover_commands(self.runtime, &package_dir)?
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        let manifests = archive::discover_manifests(self.runtime, &package_dir)?;
        let runtime_entries = match &manifests.runtime {
            Some(path) => archive::read_manifest_entries(self.runtime, path)?,
            None => Vec::new(),
        };
        let system_entries = match &manifests.system {
            Some(path) => archive::read_manifest_entries(self.runtime, path)?,
            None => Vec::new(),
        };

        // Only the delta since the last run is offered for installation
        let new_runtime: Vec<String> = runtime_entries
            .into_iter()
            .filter(|entry| {
                !updated.dependencies.runtime.contains(entry)
                    && !inventory.has_runtime_module(entry)
            })
            .collect();
        let new_system: Vec<String> = system_entries
            .into_iter()
            .filter(|entry| {
                !updated.dependencies.system.contains(entry)
                    && !inventory.has_system_package(entry)
            })
            .collect();

        if new_runtime.is_empty() && new_system.is_empty() {
            return Ok(updated);
        }

        info!("New dependencies found for {}:", name);
        if !new_runtime.is_empty() {
            info!("- Runtime: {}", new_runtime.join(", "));
        }
        if !new_system.is_empty() {
            info!("- System: {}", new_system.join(", "));
        }

        if !self
            .runtime
            .confirm("Do you want to install these new dependencies?")?
        {
            info!("Skipping new dependencies for {}.", name);
            return Ok(updated);
        }

        // Entries are already filtered; failures are skipped, never fatal
        let installer = DependencyInstaller::new(self.runtime);
        let run = installer.install_runtime(&new_runtime, &[], &SkipPolicy)?;
        updated.dependencies.runtime.extend(run.installed);
        let run = installer.install_system(&new_system, &[], &SkipPolicy)?;
        updated.dependencies.system.extend(run.installed);

        Ok(updated)
    }
}
