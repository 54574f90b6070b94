//! Creo Carbon: forwards per-container cgroup accounting to Graphite.
//!
//! For every cgroup controller of interest the library discovers the container
//! directories below `<cgroup root>/<controller>/<parent>`, watches that directory for
//! new containers, and polls each container's accounting files on a fixed interval.
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use registry::Registry;
use sink::{GraphiteSink, MetricSink};
use stats::SourceGroup;
use watch::WatchEngine;

pub mod config;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod fsutil;
pub mod registry;
pub mod sink;
pub mod stats;
pub mod task;
pub mod watch;

// Startup, per source group:
//  subscribe to creations below the group root first, then list what already exists.
//  Anything created in between shows up twice and the registry starts it once.
//
// A task stops on the first failed read of one of its files and reports back; the
// registry then forgets the path until the watch sees it created again.

/// Runs Creo Carbon until the process is killed.
///
/// # Errors
///
/// Possible errors include:
/// - Failure to connect to the carbon-cache daemon.
/// - A missing or unreadable group root (discovery or watch setup).
/// - A panic in a group's event loop.
pub async fn run(config: Config) -> error::Result<()> {
    let config = Arc::new(config);
    let sink = Arc::new(
        GraphiteSink::connect(&config.sink_host, config.sink_port, config.global_prefix())
            .await?,
    );

    let mut monitors = tokio::task::JoinSet::new();
    for group in SourceGroup::defaults() {
        let root = config.controller_root(group.controller);
        let registry = Registry::new(Arc::clone(&config), group, Arc::clone(&sink));
        let (watch, registry) = start_monitor(root, registry).await?;
        monitors.spawn(async move {
            let _watch = watch;
            registry.run().await
        });
    }

    match monitors.join_next().await {
        Some(Ok(never)) => match never {},
        Some(Err(err)) => Err(error::Error::Join(err)),
        None => Ok(()),
    }
}

/// Subscribes to `root`, then starts a task for every entity already present.
async fn start_monitor<S: MetricSink>(
    root: PathBuf,
    mut registry: Registry<S>,
) -> error::Result<(WatchEngine, Registry<S>)> {
    let watch = WatchEngine::subscribe(&root, registry.arrivals())?;
    let existing = discovery::discover(&root).await?;
    log::info!(
        "Found {} existing {} entities in {}",
        existing.len(),
        registry.group().label,
        root.display()
    );
    for path in existing {
        registry.start(path);
    }
    Ok((watch, registry))
}
