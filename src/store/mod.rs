//! Persistent state for installed packages and host inventory caches.

mod manifest;
mod state;

pub use manifest::{Dependencies, ManifestRecord, PackageManifest, Registry};
pub use state::StateStore;
