use std::io;
use std::path::{Path, PathBuf};

/// Error that occurs when reading a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Reads the whole file at the given path into a string.
///
/// # Errors
///
/// Returns a [`FileReadError`] carrying the path if the file cannot be opened or read.
///
/// # Example
/// ```no_run
/// # use creo_carbon::fsutil;
/// # async fn demo() -> Result<(), fsutil::FileReadError> {
/// let content = fsutil::read_to_string("/sys/fs/cgroup/memory/docker/abc/memory.stat").await?;
/// # Ok(())
/// # }
/// ```
pub async fn read_to_string(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileReadError {
            path: path.to_path_buf(),
            source,
        })
}

/// Returns whether `path` currently resolves to a directory.
///
/// Follows symlinks, like `stat(2)`.
pub fn is_dir(path: impl AsRef<Path>) -> io::Result<bool> {
    Ok(std::fs::metadata(path)?.is_dir())
}
