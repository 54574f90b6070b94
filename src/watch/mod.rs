//! Live detection of entities created below a root directory.
//!
//! The [`WatchEngine`] subscribes to filesystem notifications for the root (not its
//! subtree) and forwards every newly created directory as an arrival to the registry.
use std::path::{Path, PathBuf};

use notify::{Event, EventHandler, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to create filesystem watcher: {0}")]
    Init(#[source] notify::Error),
    #[error("failed to watch `{path}`: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Keeps the subscription alive. Dropping it stops the notifications.
pub struct WatchEngine {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for WatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEngine")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatchEngine {
    /// Subscribes to creations below `root` and sends new directories into `arrivals`.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Init`] if the platform watcher cannot be created.
    /// - [`WatchError::Subscribe`] if `root` cannot be watched, e.g. because it is missing.
    pub fn subscribe(
        root: impl AsRef<Path>,
        arrivals: mpsc::Sender<PathBuf>,
    ) -> Result<Self, WatchError> {
        let root = root.as_ref().to_path_buf();
        let handler = ArrivalForwarder { arrivals };
        let mut watcher = notify::recommended_watcher(handler).map_err(WatchError::Init)?;
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Subscribe {
                path: root.clone(),
                source,
            })?;
        log::info!("Watching {} for new entities", root.display());

        Ok(Self {
            root,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Runs on the watcher's own thread, outside of the async runtime.
struct ArrivalForwarder {
    arrivals: mpsc::Sender<PathBuf>,
}

impl EventHandler for ArrivalForwarder {
    fn handle_event(&mut self, event: Result<Event, notify::Error>) {
        match event {
            Ok(Event {
                kind: EventKind::Create(kind),
                paths,
                ..
            }) => {
                for path in paths {
                    log::trace!("Saw created path {} ({kind:?})", path.display());
                    self.forward(path);
                }
            }
            Ok(_) => {}
            Err(err) => log::error!("watch error: {err}"),
        }
    }
}

impl ArrivalForwarder {
    fn forward(&self, path: PathBuf) {
        match crate::fsutil::is_dir(&path) {
            Ok(true) => {
                if self.arrivals.blocking_send(path).is_err() {
                    log::warn!("registry stopped listening, dropping arrival");
                }
            }
            Ok(false) => {}
            Err(err) => log::warn!("failed to inspect created path {}: {err}", path.display()),
        }
    }
}
