//! Archive installation: zip extraction into a package directory.

mod scan;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

use crate::runtime::Runtime;

pub use scan::{DiscoveredManifests, discover_commands, discover_manifests, read_manifest_entries};

/// Name of the temporary archive file written inside the package directory.
const ARCHIVE_FILE_NAME: &str = "package.zip";

/// Extension marking an interpreted-script command artifact.
pub const SCRIPT_EXT: &str = "py";

/// Extension marking a shell-script command artifact.
pub const SHELL_EXT: &str = "sh";

/// Extract an archive payload into `dest`.
///
/// The payload is first written to `package.zip` inside `dest`, extracted
/// in place, and the zip file is removed afterwards. Branch archives from
/// source hosting wrap their contents one directory deeper
/// (`{repo}-main/...`); a single shared top-level directory is stripped so
/// the package contents land directly in `dest`. Existing files are
/// overwritten; extra files from a previous extraction are left alone.
#[tracing::instrument(skip(runtime, payload))]
pub fn extract<R: Runtime>(runtime: &R, payload: &[u8], dest: &Path) -> Result<()> {
    debug!("Extracting archive into {:?}...", dest);

    let zip_path = dest.join(ARCHIVE_FILE_NAME);
    runtime
        .write(&zip_path, payload)
        .with_context(|| format!("Failed to write archive to {:?}", zip_path))?;

    let cursor = std::io::Cursor::new(payload);
    let mut archive = ZipArchive::new(cursor).context("Failed to parse ZIP archive")?;

    if archive.is_empty() {
        return Err(anyhow!("Archive appears to be empty."));
    }

    let strip_prefix = shared_top_level_dir(&mut archive)?;
    if let Some(ref prefix) = strip_prefix {
        debug!("Stripping wrapping directory {:?}", prefix);
    }

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read ZIP entry {}", i))?;

        let entry_path = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                debug!("Skipping entry with invalid path");
                continue;
            }
        };

        let entry_path = match strip_prefix {
            Some(ref prefix) => match entry_path.strip_prefix(prefix) {
                Ok(stripped) if stripped.as_os_str().is_empty() => continue,
                Ok(stripped) => stripped.to_path_buf(),
                Err(_) => entry_path,
            },
            None => entry_path,
        };

        let full_path = dest.join(&entry_path);

        if entry.is_dir() {
            runtime.create_dir_all(&full_path)?;
        } else {
            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }
            let mut dest_file = runtime.create_file(&full_path)?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;

            // Set file permissions from archive metadata (Unix only)
            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }
    }

    runtime
        .remove_file(&zip_path)
        .with_context(|| format!("Failed to remove archive file {:?}", zip_path))?;

    info!("Extraction complete.");
    Ok(())
}

/// Returns the single top-level directory shared by every entry, if any.
fn shared_top_level_dir<T: Read + std::io::Seek>(
    archive: &mut ZipArchive<T>,
) -> Result<Option<PathBuf>> {
    let mut shared: Option<PathBuf> = None;

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read ZIP entry {}", i))?;

        let entry_path = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => continue,
        };

        // Bare top-level files rule out a shared wrapping directory
        let mut components = entry_path.components();
        let first = match components.next() {
            Some(Component::Normal(name)) => PathBuf::from(name),
            _ => return Ok(None),
        };
        if components.next().is_none() && !entry.is_dir() {
            return Ok(None);
        }

        match shared {
            None => shared = Some(first),
            Some(ref dir) if *dir == first => {}
            Some(_) => return Ok(None),
        }
    }

    Ok(shared)
}
