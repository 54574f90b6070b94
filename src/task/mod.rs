//! Per-entity polling.
//!
//! A [`CollectionTask`] reads every stat source of one entity on a fixed interval and
//! pushes the extracted metrics as one batch. The first failed read ends the task for
//! good: the entity is considered removed and a completion signal carrying its path is
//! sent back to the registry. A returning entity gets a brand new task.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::entity::EntityHandle;
use crate::fsutil;
use crate::sink::MetricSink;
use crate::stats::{Metric, SourceGroup, StatReadError};

/// Polls the stat sources of a single entity.
#[derive(Debug)]
pub struct CollectionTask<S> {
    entity: EntityHandle,
    group: Arc<SourceGroup>,
    prefix: String,
    interval: Duration,
    sink: Arc<S>,
}

impl<S: MetricSink> CollectionTask<S> {
    pub fn new(
        entity: EntityHandle,
        group: Arc<SourceGroup>,
        interval: Duration,
        sink: Arc<S>,
    ) -> Self {
        let prefix = group.prefix_for(entity.name());
        Self {
            entity,
            group,
            prefix,
            interval,
            sink,
        }
    }

    pub fn entity(&self) -> &EntityHandle {
        &self.entity
    }

    /// Reads all sources once and returns the metrics of this cycle.
    ///
    /// Every metric carries `timestamp`. Sources are read in group order and nothing
    /// is returned if any of them fails.
    ///
    /// # Errors
    ///
    /// Returns a [`StatReadError`] for the first source that cannot be read.
    pub async fn poll(&self, timestamp: u64) -> Result<Vec<Metric>, StatReadError> {
        let mut batch = Vec::new();
        for source in &self.group.sources {
            let content = fsutil::read_to_string(self.entity.path().join(source.file_name))
                .await
                .map_err(|err| StatReadError {
                    entity: self.entity.name().to_owned(),
                    file_name: source.file_name,
                    source: err,
                })?;
            source
                .shape
                .extract(source.file_name, &content, &self.prefix, timestamp, &mut batch);
        }
        Ok(batch)
    }

    /// Polls until a source read fails, then reports the entity path on `done` once.
    pub async fn run(self, done: mpsc::Sender<PathBuf>) {
        loop {
            let timestamp = unix_timestamp();
            match self.poll(timestamp).await {
                Ok(batch) => {
                    log::trace!(
                        "Pushing {} metrics of {}@{timestamp}",
                        batch.len(),
                        self.prefix
                    );
                    if let Err(err) = self.sink.push(&batch).await {
                        log::error!(
                            "failed to push metrics: entity={}, group={}, error={}",
                            self.entity,
                            self.group.label,
                            err
                        );
                    }
                }
                Err(err) => {
                    // a vanished cgroup and a flaky read look the same from here
                    log::info!("Stopped polling {}: {}", self.entity, err);
                    break;
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        let path = self.entity.path().to_path_buf();
        if done.send(path).await.is_err() {
            log::warn!(
                "registry gone before completion of {} was delivered",
                self.entity.path().display()
            );
        }
    }
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
