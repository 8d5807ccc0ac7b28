//! Install action - fetch, extract, register, and install dependencies.

use anyhow::Result;
use log::{info, warn};

use crate::archive;
use crate::deps::{DependencyInstaller, FailurePolicy};
use crate::host;
use crate::ops::OpReport;
use crate::runtime::Runtime;
use crate::source::Source;
use crate::store::{PackageManifest, Registry, StateStore};

/// Install action - brings one package from the remote source onto the
/// host and records its manifest.
pub struct InstallAction<'a, R: Runtime, S: Source> {
    runtime: &'a R,
    source: &'a S,
    store: StateStore<'a, R>,
}

impl<'a, R: Runtime, S: Source> InstallAction<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runtime,
            source,
            store: StateStore::new(runtime, root.into()),
        }
    }

    /// Install `name`. Dependency failures are resolved through `policy`;
    /// an abort rolls back the package directory and its manifest.
    pub async fn install(&self, name: &str, policy: &dyn FailurePolicy) -> Result<OpReport> {
        let mut registry = self.store.load_registry()?;
        if registry.contains(name) {
            return Ok(OpReport::no_op(format!(
                "Package {} is already installed.",
                name
            )));
        }

        info!("Installing package: {}", name);
        let payload = match self.source.fetch_archive(name).await {
            Ok(payload) => payload,
            Err(error) if error.is_not_found() => {
                return Ok(OpReport::failed(format!("Package {} not found.", name)));
            }
            Err(error) => {
                return Ok(OpReport::failed(format!(
                    "Error downloading package: {}",
                    error
                )));
            }
        };

        let package_dir = self.store.package_dir(name);
        self.runtime.create_dir_all(&package_dir)?;
        if let Err(error) = archive::extract(self.runtime, &payload, &package_dir) {
            return Ok(OpReport::failed(format!(
                "Error extracting package: {:#}",
                error
            )));
        }

        // Commands are recorded before dependency installation begins
        let mut manifest = PackageManifest::default();
        for path in archive::discover_commands(self.runtime, &package_dir)? {
            if let Some(stem) = path.file_stem() {
                info!("Adding command: {}", stem.to_string_lossy());
            }
            manifest.commands.push(path.to_string_lossy().into_owned());
        }
        registry.insert(name, manifest.clone());
        self.store.save_registry(&registry)?;
        info!("Package {} installed successfully.", name);

        let manifests = archive::discover_manifests(self.runtime, &package_dir)?;
        let runtime_entries = match &manifests.runtime {
            Some(path) => archive::read_manifest_entries(self.runtime, path)?,
            None => Vec::new(),
        };
        let system_entries = match &manifests.system {
            Some(path) => archive::read_manifest_entries(self.runtime, path)?,
            None => Vec::new(),
        };

        if runtime_entries.is_empty() && system_entries.is_empty() {
            info!("No dependencies found.");
        } else {
            info!("Dependencies found:");
            if !runtime_entries.is_empty() {
                info!("- Runtime: {}", runtime_entries.join(", "));
            }
            if !system_entries.is_empty() {
                info!("- System: {}", system_entries.join(", "));
            }

            if self
                .runtime
                .confirm("Do you want to install these dependencies?")?
            {
                let inventory = host::load(&self.store)?;
                let installer = DependencyInstaller::new(self.runtime);

                let run = installer.install_runtime(
                    &runtime_entries,
                    &inventory.runtime_modules,
                    policy,
                )?;
                manifest.dependencies.runtime.extend(run.installed);
                if run.aborted {
                    self.rollback(name, &mut registry);
                    return Ok(OpReport::failed(format!(
                        "Installation of {} aborted; package removed.",
                        name
                    )));
                }

                let run = installer.install_system(
                    &system_entries,
                    &inventory.system_packages,
                    policy,
                )?;
                manifest.dependencies.system.extend(run.installed);
                if run.aborted {
                    self.rollback(name, &mut registry);
                    return Ok(OpReport::failed(format!(
                        "Installation of {} aborted; package removed.",
                        name
                    )));
                }

                registry.insert(name, manifest);
                self.store.save_registry(&registry)?;
            } else {
                info!("Skipping dependency installation.");
            }
        }

        host::refresh(self.runtime, &self.store);
        Ok(OpReport::success(format!(
            "Installation of {} complete.",
            name
        )))
    }

    /// Best-effort rollback after an aborted dependency installation.
    /// Failures here are reported but never compound the abort.
    fn rollback(&self, name: &str, registry: &mut Registry) {
        info!("Uninstalling package...");
        let package_dir = self.store.package_dir(name);
        if let Err(error) = self.runtime.remove_dir_all(&package_dir) {
            warn!("Error removing {}: {:#}", package_dir.display(), error);
        }
        registry.remove(name);
        if let Err(error) = self.store.save_registry(registry) {
            warn!("Error saving package registry: {:#}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::build_archive;
    use crate::deps::{FailureAction, MockFailurePolicy};
    use crate::http::FetchError;
    use crate::ops::testutil::ScriptedRuntime;
    use crate::ops::OpStatus;
    use crate::source::MockSource;
    use tempfile::tempdir;

    fn no_failures() -> MockFailurePolicy {
        // Strict: any on_failure call fails the test
        MockFailurePolicy::new()
    }

    fn archive_source(files: &[(&str, &str)]) -> MockSource {
        let payload = build_archive(files).unwrap();
        let mut source = MockSource::new();
        source
            .expect_fetch_archive()
            .returning(move |_| Ok(payload.clone()));
        source
    }

    #[tokio::test]
    async fn test_install_records_commands_and_empty_deps() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime::default();
        let source =
            archive_source(&[("demo-main/run.py", "print()"), ("demo-main/notes.txt", "x")]);

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &no_failures()).await.unwrap();

        assert_eq!(report.status, OpStatus::Success);
        let registry = action.store.load_registry().unwrap();
        let manifest = registry.get("demo").unwrap();
        assert_eq!(manifest.commands.len(), 1);
        assert!(manifest.commands[0].ends_with("run.py"));
        assert!(manifest.dependencies.runtime.is_empty());
        assert!(manifest.dependencies.system.is_empty());
    }

    #[tokio::test]
    async fn test_install_confirmed_deps_are_recorded() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime {
            confirm_answer: true,
            ..Default::default()
        };
        let source = archive_source(&[
            ("demo-main/run.py", "print()"),
            ("demo-main/setup.sh", "true"),
            ("demo-main/requirements.txt", "requests\n"),
        ]);

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &no_failures()).await.unwrap();

        assert_eq!(report.status, OpStatus::Success);
        let registry = action.store.load_registry().unwrap();
        let manifest = registry.get("demo").unwrap();
        assert_eq!(manifest.commands.len(), 2);
        assert_eq!(manifest.dependencies.runtime, vec!["requests"]);
        assert!(manifest.dependencies.system.is_empty());
    }

    #[tokio::test]
    async fn test_install_declined_deps_are_not_recorded() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime {
            confirm_answer: false,
            ..Default::default()
        };
        let source = archive_source(&[
            ("demo-main/run.py", "print()"),
            ("demo-main/requirements.txt", "requests\n"),
        ]);

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &no_failures()).await.unwrap();

        assert_eq!(report.status, OpStatus::Success);
        let registry = action.store.load_registry().unwrap();
        assert!(registry.get("demo").unwrap().dependencies.runtime.is_empty());
    }

    #[tokio::test]
    async fn test_install_already_installed_is_a_noop() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime::default();
        let source = MockSource::new();

        let store = StateStore::new(&runtime, dir.path().to_path_buf());
        let mut registry = Registry::new();
        registry.insert("demo", PackageManifest::default());
        store.save_registry(&registry).unwrap();
        let before = runtime.read_to_string(&store.registry_path()).unwrap();

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &no_failures()).await.unwrap();

        assert_eq!(report.status, OpStatus::NoOp);
        let after = runtime.read_to_string(&store.registry_path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_install_not_found_creates_nothing() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime::default();
        let mut source = MockSource::new();
        source
            .expect_fetch_archive()
            .returning(|_| Err(FetchError::NotFound("status 404".to_string())));

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &no_failures()).await.unwrap();

        assert_eq!(report.status, OpStatus::Failed);
        assert!(!runtime.exists(&action.store.package_dir("demo")));
        assert!(!action.store.load_registry().unwrap().contains("demo"));
    }

    #[tokio::test]
    async fn test_install_abort_rolls_back_directory_and_manifest() {
        let dir = tempdir().unwrap();
        let runtime = ScriptedRuntime {
            confirm_answer: true,
            command_code: 1,
            ..Default::default()
        };
        let source = archive_source(&[
            ("demo-main/run.py", "print()"),
            ("demo-main/requirements.txt", "unresolvable\n"),
        ]);

        let mut policy = MockFailurePolicy::new();
        policy
            .expect_on_failure()
            .returning(|_, _| Ok(FailureAction::AbortInstall));

        let action = InstallAction::new(&runtime, &source, dir.path());
        let report = action.install("demo", &policy).await.unwrap();

        assert_eq!(report.status, OpStatus::Failed);
        assert!(!runtime.exists(&action.store.package_dir("demo")));
        assert!(!action.store.load_registry().unwrap().contains("demo"));
    }
}
