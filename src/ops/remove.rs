//! Remove action - deletes a package's directory and its manifest together.

use anyhow::Result;
use log::info;

use crate::ops::OpReport;
use crate::runtime::Runtime;
use crate::store::StateStore;

pub struct RemoveAction<'a, R: Runtime> {
    runtime: &'a R,
    store: StateStore<'a, R>,
}

impl<'a, R: Runtime> RemoveAction<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runtime,
            store: StateStore::new(runtime, root.into()),
        }
    }

    /// Remove `name`. Unknown packages are a reported no-op, never an
    /// error. The directory and the manifest go together so the store
    /// never ends up describing a package that is not on disk.
    pub fn remove(&self, name: &str) -> Result<OpReport> {
        info!("Removing package: {}", name);
        let mut registry = self.store.load_registry()?;
        let package_dir = self.store.package_dir(name);

        let had_manifest = registry.contains(name);
        let had_dir = self.runtime.exists(&package_dir);
        if !had_manifest && !had_dir {
            return Ok(OpReport::no_op(format!(
                "Package {} is not installed.",
                name
            )));
        }

        if had_dir {
            self.runtime.remove_dir_all(&package_dir)?;
        }
        if had_manifest {
            registry.remove(name);
            self.store.save_registry(&registry)?;
        }

        Ok(OpReport::success(format!(
            "Package {} removed successfully.",
            name
        )))
    }
}
