use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of characters kept from the directory name in short-id mode.
pub const SHORT_ID_LEN: usize = 12;

/// A monitored accounting directory, e.g. one container's cgroup.
///
/// The handle is cheap to clone and never changes after construction.
///
/// # Examples
///
/// ```
/// # use creo_carbon::entity::EntityHandle;
/// let entity = EntityHandle::new("/sys/fs/cgroup/memory/docker/abcdef0123456789container", true);
/// assert_eq!(entity.name(), "abcdef012345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    path: Arc<Path>,
    name: Arc<str>,
}

impl EntityHandle {
    /// Creates a handle for the directory at `path`.
    ///
    /// The display name is the final path component, cut to [`SHORT_ID_LEN`] characters
    /// if `short_id` is set. Names shorter than that are kept as they are.
    pub fn new(path: impl Into<PathBuf>, short_id: bool) -> Self {
        let path: PathBuf = path.into();
        let name = display_name(&path, short_id);
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn display_name(path: &Path, short_id: bool) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !short_id {
        return base;
    }

    match base.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => base[..idx].to_owned(),
        None => base,
    }
}
