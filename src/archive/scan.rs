//! Discovery of command artifacts and dependency manifests in an
//! extracted package tree.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::{SCRIPT_EXT, SHELL_EXT};

/// File name listing runtime-level dependencies, one per line.
pub const RUNTIME_MANIFEST: &str = "requirements.txt";

/// File name listing system-level dependencies, one per line.
pub const SYSTEM_MANIFEST: &str = "apt.txt";

/// Dependency manifest files found in an extracted tree.
#[derive(Debug, Default, PartialEq)]
pub struct DiscoveredManifests {
    pub runtime: Option<PathBuf>,
    pub system: Option<PathBuf>,
}

/// Walk the extracted tree and collect every script file, in walk order.
///
/// Files with a `.py` or `.sh` extension are command artifacts; their
/// filename stems become runnable command names. Duplicate stems are kept
/// as-is; resolution order decides which one runs.
pub fn discover_commands<R: Runtime>(runtime: &R, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut commands = Vec::new();
    walk(runtime, dir, &mut |path| {
        if let Some(ext) = path.extension().and_then(|e| e.to_str())
            && (ext == SCRIPT_EXT || ext == SHELL_EXT)
        {
            debug!("Adding command: {:?}", path.file_stem().unwrap_or_default());
            commands.push(path.to_path_buf());
        }
        true
    })?;
    Ok(commands)
}

/// Walk the extracted tree looking for the two dependency manifest files.
/// The first occurrence of each wins if copies exist at several depths.
pub fn discover_manifests<R: Runtime>(runtime: &R, dir: &Path) -> Result<DiscoveredManifests> {
    let mut found = DiscoveredManifests::default();
    walk(runtime, dir, &mut |path| {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(RUNTIME_MANIFEST) if found.runtime.is_none() => {
                found.runtime = Some(path.to_path_buf());
            }
            Some(SYSTEM_MANIFEST) if found.system.is_none() => {
                found.system = Some(path.to_path_buf());
            }
            _ => {}
        }
        // Stop early once both are found
        found.runtime.is_none() || found.system.is_none()
    })?;
    Ok(found)
}

/// Read a dependency manifest: trimmed non-blank lines, file order kept.
pub fn read_manifest_entries<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<String>> {
    let contents = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read dependency manifest {:?}", path))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Depth-first walk over files under `dir` through the Runtime, so tests
/// can drive it with a mock. The visitor returns false to stop the walk.
fn walk<R: Runtime>(
    runtime: &R,
    dir: &Path,
    visit: &mut dyn FnMut(&Path) -> bool,
) -> Result<bool> {
    for entry in runtime
        .read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?
    {
        if runtime.is_dir(&entry) {
            if !walk(runtime, &entry, visit)? {
                return Ok(false);
            }
        } else if !visit(&entry) {
            return Ok(false);
        }
    }
    Ok(true)
}
