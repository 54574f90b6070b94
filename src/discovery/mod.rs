//! One-shot discovery of the entities that already exist below a root directory.
use std::path::{Path, PathBuf};

use crate::error::ResultOkLogExt;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The root itself cannot be listed. Nothing can be monitored without it.
    #[error("failed to read entity root `{path}`: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A single candidate could not be inspected, e.g. because it vanished in between.
    #[error("failed to inspect candidate entity `{path}`: {source}")]
    InspectEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists the immediate child directories of `root`.
///
/// Entries that are not directories are ignored. Entries that fail inspection are
/// logged and skipped. The order of the result is unspecified.
///
/// # Errors
///
/// Returns [`DiscoveryError::ReadRoot`] if `root` cannot be listed.
pub async fn discover(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = root.as_ref();
    let read_root = |source: std::io::Error| DiscoveryError::ReadRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(read_root)?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_root)? {
        let path = entry.path();
        // follow symlinks like stat(2) so linked entity directories count
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_dir())
            .map_err(|source| DiscoveryError::InspectEntry {
                path: path.clone(),
                source,
            })
            .ok_log();
        if is_dir == Some(true) {
            found.push(path);
        }
    }

    log::debug!("Discovered {} entities below {}", found.len(), root.display());
    Ok(found)
}
