//! Configuration file watcher for hot reload.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::registry::{ConfigFile, ConfigRegistry};

/// Outcome of a reload triggered by a file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The new configuration is live.
    Reloaded { path: PathBuf },
    /// The change was rejected; the previous configuration stays live.
    Rejected { path: PathBuf, error: String },
}

/// A watcher that reloads an open configuration when its files change.
pub struct ConfigWatcher {
    registry: Arc<ConfigRegistry>,
    file: ConfigFile,
    update_tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for reload outcomes.
    pub fn new(
        registry: Arc<ConfigRegistry>,
        file: ConfigFile,
    ) -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                registry,
                file,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// Parent directories are watched rather than the files themselves so
    /// that a file created after startup, or replaced by rename, is seen.
    /// Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher> {
        let watched: Vec<PathBuf> = self.file.paths().iter().map(Path::to_path_buf).collect();
        let dirs: BTreeSet<PathBuf> = watched
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();

        let registry = self.registry;
        let file = self.file;
        let tx = self.update_tx;
        let targets = watched.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                        return;
                    }
                    let Some(path) = event.paths.iter().find(|p| targets.contains(p)) else {
                        return;
                    };
                    tracing::info!(path = %path.display(), "Config file change detected, reloading...");
                    let update = match registry.reload(&file) {
                        Ok(()) => ReloadEvent::Reloaded { path: path.clone() },
                        Err(e) => {
                            tracing::error!(
                                path = %path.display(),
                                error = %e,
                                "Failed to reload config. Keeping current configuration."
                            );
                            ReloadEvent::Rejected {
                                path: path.clone(),
                                error: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(update);
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?watched, "Config watcher started");
        Ok(watcher)
    }
}
