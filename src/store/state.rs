//! On-disk state store under the user config directory.
//!
//! Layout:
//! - `<root>/installed_packages.json` - registry (name -> manifest)
//! - `<root>/installed_modules.json` - cached runtime modules on the host
//! - `<root>/installed_system_packages.json` - cached system packages
//! - `<root>/packages/<name>/` - extracted package trees
//!
//! Every save rewrites the whole file. Nothing takes a lock: concurrent
//! instances over the same root are the caller's problem.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::Registry;

const REGISTRY_FILE: &str = "installed_packages.json";
const MODULES_FILE: &str = "installed_modules.json";
const SYSTEM_PACKAGES_FILE: &str = "installed_system_packages.json";
const PACKAGES_DIR: &str = "packages";

/// State store rooted at a config directory.
pub struct StateStore<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> StateStore<'a, R> {
    pub fn new(runtime: &'a R, root: PathBuf) -> Self {
        Self { runtime, root }
    }

    /// Default root: `<config_dir>/lpm` (e.g. `~/.config/lpm` on Linux).
    pub fn default_root(runtime: &R) -> Result<PathBuf> {
        runtime
            .config_dir()
            .map(|dir| dir.join("lpm"))
            .ok_or_else(|| anyhow!("Could not determine the user config directory"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one subdirectory per installed package.
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join(PACKAGES_DIR)
    }

    /// Extraction directory for a named package.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    pub fn modules_path(&self) -> PathBuf {
        self.root.join(MODULES_FILE)
    }

    pub fn system_packages_path(&self) -> PathBuf {
        self.root.join(SYSTEM_PACKAGES_FILE)
    }

    /// Load the installed-package registry. A missing file is an empty
    /// registry, not an error.
    pub fn load_registry(&self) -> Result<Registry> {
        self.load_json(&self.registry_path())
            .map(|r| r.unwrap_or_default())
    }

    /// Persist the registry, rewriting the file wholesale.
    pub fn save_registry(&self, registry: &Registry) -> Result<()> {
        self.save_json(&self.registry_path(), registry)
    }

    /// Load the cached list of runtime modules present on the host.
    pub fn load_runtime_modules(&self) -> Result<Vec<String>> {
        self.load_json(&self.modules_path())
            .map(|r| r.unwrap_or_default())
    }

    /// Overwrite the runtime-module cache.
    pub fn save_runtime_modules(&self, modules: &[String]) -> Result<()> {
        self.save_json(&self.modules_path(), &modules)
    }

    /// Load the cached list of system packages present on the host.
    pub fn load_system_packages(&self) -> Result<Vec<String>> {
        self.load_json(&self.system_packages_path())
            .map(|r| r.unwrap_or_default())
    }

    /// Overwrite the system-package cache.
    pub fn save_system_packages(&self, packages: &[String]) -> Result<()> {
        self.save_json(&self.system_packages_path(), &packages)
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !self.runtime.exists(path) {
            return Ok(None);
        }
        let contents = self
            .runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read state file {:?}", path))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state file {:?}", path))?;
        Ok(Some(value))
    }

    fn save_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(value)?;
        self.runtime
            .write(path, contents.as_bytes())
            .with_context(|| format!("Failed to save state file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::store::PackageManifest;
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_paths() {
        let runtime = MockRuntime::new();
        let store = StateStore::new(&runtime, PathBuf::from("/cfg/lpm"));

        assert_eq!(
            store.registry_path(),
            PathBuf::from("/cfg/lpm/installed_packages.json")
        );
        assert_eq!(
            store.modules_path(),
            PathBuf::from("/cfg/lpm/installed_modules.json")
        );
        assert_eq!(
            store.system_packages_path(),
            PathBuf::from("/cfg/lpm/installed_system_packages.json")
        );
        assert_eq!(
            store.package_dir("mytool"),
            PathBuf::from("/cfg/lpm/packages/mytool")
        );
    }

    #[test]
    fn test_default_root() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        let root = StateStore::default_root(&runtime).unwrap();
        assert_eq!(root, PathBuf::from("/home/user/.config/lpm"));
    }

    #[test]
    fn test_default_root_missing_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);

        assert!(StateStore::<MockRuntime>::default_root(&runtime).is_err());
    }

    #[test]
    fn test_load_registry_missing_file_is_empty() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/cfg/lpm/installed_packages.json")))
            .returning(|_| false);

        let store = StateStore::new(&runtime, PathBuf::from("/cfg/lpm"));
        let registry = store.load_registry().unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let store = StateStore::new(&runtime, dir.path().join("lpm"));

        let mut registry = Registry::new();
        registry.insert(
            "mytool",
            PackageManifest {
                commands: vec!["/x/run.py".into()],
                ..Default::default()
            },
        );
        store.save_registry(&registry).unwrap();

        let loaded = store.load_registry().unwrap();
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_inventory_caches_roundtrip() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let store = StateStore::new(&runtime, dir.path().join("lpm"));

        assert!(store.load_runtime_modules().unwrap().is_empty());

        store
            .save_runtime_modules(&["requests".into(), "flask".into()])
            .unwrap();
        store.save_system_packages(&["curl".into()]).unwrap();

        assert_eq!(
            store.load_runtime_modules().unwrap(),
            vec!["requests", "flask"]
        );
        assert_eq!(store.load_system_packages().unwrap(), vec!["curl"]);
    }

    #[test]
    fn test_save_is_full_overwrite() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let store = StateStore::new(&runtime, dir.path().join("lpm"));

        store.save_runtime_modules(&["old".into()]).unwrap();
        store.save_runtime_modules(&["new".into()]).unwrap();

        assert_eq!(store.load_runtime_modules().unwrap(), vec!["new"]);
    }

    #[test]
    fn test_load_registry_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let store = StateStore::new(&runtime, dir.path().to_path_buf());
        runtime
            .write(&store.registry_path(), b"{ not json")
            .unwrap();

        assert!(store.load_registry().is_err());
    }
}
