//! Refresh action - re-queries the host inventory caches on demand.

use anyhow::Result;

use crate::host;
use crate::ops::OpReport;
use crate::runtime::Runtime;
use crate::store::StateStore;

pub struct RefreshAction<'a, R: Runtime> {
    runtime: &'a R,
    store: StateStore<'a, R>,
}

impl<'a, R: Runtime> RefreshAction<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runtime,
            store: StateStore::new(runtime, root.into()),
        }
    }

    /// Overwrite both host inventory caches from the host's query tools.
    /// A failed query keeps the stale cache and is only logged.
    pub fn refresh(&self) -> Result<OpReport> {
        let inventory = host::refresh(self.runtime, &self.store);
        Ok(OpReport::success(format!(
            "Host inventory refreshed: {} runtime modules, {} system packages.",
            inventory.runtime_modules.len(),
            inventory.system_packages.len()
        )))
    }
}
