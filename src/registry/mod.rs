//! Lifecycle authority over the monitored entities of one source group.
//!
//! The [`Registry`] is the only owner of the set of active entities. It runs a single
//! event loop fed by two channels: arrivals (discovery and the watch engine) and
//! completions (finished collection tasks). Membership is only touched while handling
//! one of those events, so no lock is needed.
//!
//! # Invariant
//!
//! A path is in the active set if and only if exactly one [`CollectionTask`] is running
//! for it.
use std::collections::HashSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::entity::EntityHandle;
use crate::error::ResultOkLogExt;
use crate::sink::MetricSink;
use crate::stats::SourceGroup;
use crate::task::CollectionTask;

const ARRIVAL_CHANNEL_CAPACITY: usize = 64;
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A task reported completion for a path that was never started. This is a bug.
    #[error("completion signal for untracked entity `{path}`")]
    UntrackedCompletion { path: PathBuf },
}

/// Input of the registry's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The entity should be (or already is) monitored.
    Arrived(PathBuf),
    /// The task of the entity has stopped.
    Completed(PathBuf),
}

/// Starts one [`CollectionTask`] per arriving entity and retires it on completion.
#[derive(Debug)]
pub struct Registry<S> {
    config: Arc<Config>,
    group: Arc<SourceGroup>,
    sink: Arc<S>,
    active: HashSet<PathBuf>,
    arrival_tx: mpsc::Sender<PathBuf>,
    arrival_rx: mpsc::Receiver<PathBuf>,
    completion_tx: mpsc::Sender<PathBuf>,
    completion_rx: mpsc::Receiver<PathBuf>,
}

impl<S: MetricSink> Registry<S> {
    pub fn new(config: Arc<Config>, group: SourceGroup, sink: Arc<S>) -> Self {
        let (arrival_tx, arrival_rx) = mpsc::channel(ARRIVAL_CHANNEL_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            config,
            group: Arc::new(group),
            sink,
            active: HashSet::new(),
            arrival_tx,
            arrival_rx,
            completion_tx,
            completion_rx,
        }
    }

    /// Returns a sender for arrival events, e.g. for a [`crate::watch::WatchEngine`].
    pub fn arrivals(&self) -> mpsc::Sender<PathBuf> {
        self.arrival_tx.clone()
    }

    pub fn group(&self) -> &SourceGroup {
        &self.group
    }

    /// Starts monitoring `path` unless it is empty or already active.
    ///
    /// Returns `true` if a new task was spawned.
    pub fn start(&mut self, path: PathBuf) -> bool {
        if path.as_os_str().is_empty() || self.active.contains(&path) {
            return false;
        }

        let entity = EntityHandle::new(path.clone(), self.config.short_id);
        log::info!(
            "Adding new {} entity {} with path: {}",
            self.group.label,
            entity,
            path.display()
        );
        self.active.insert(path);

        let task = CollectionTask::new(
            entity,
            Arc::clone(&self.group),
            self.config.interval,
            Arc::clone(&self.sink),
        );
        tokio::spawn(task.run(self.completion_tx.clone()));
        true
    }

    /// Marks `path` inactive after its task has stopped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UntrackedCompletion`] if `path` was not active. The
    /// active set is left untouched in that case.
    pub fn complete(&mut self, path: &Path) -> Result<(), RegistryError> {
        if !self.active.remove(path) {
            return Err(RegistryError::UntrackedCompletion {
                path: path.to_path_buf(),
            });
        }
        log::info!(
            "Removing finished {} entity with path: {}",
            self.group.label,
            path.display()
        );
        Ok(())
    }

    pub fn is_active(&self, path: &Path) -> bool {
        self.active.contains(path)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Waits for the next arrival or completion, whichever comes first.
    pub async fn next_event(&mut self) -> RegistryEvent {
        // self holds a sender of both channels, so neither receiver ever yields None
        tokio::select! {
            Some(path) = self.arrival_rx.recv() => RegistryEvent::Arrived(path),
            Some(path) = self.completion_rx.recv() => RegistryEvent::Completed(path),
        }
    }

    pub fn handle(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Arrived(path) => {
                self.start(path);
            }
            RegistryEvent::Completed(path) => {
                self.complete(&path).ok_log();
            }
        }
    }

    /// Runs the event loop forever.
    ///
    /// The registry keeps its own senders alive, so the loop never runs out of input.
    pub async fn run(mut self) -> Infallible {
        loop {
            let event = self.next_event().await;
            log::trace!("{} registry event: {:?}", self.group.label, event);
            self.handle(event);
        }
    }
}
