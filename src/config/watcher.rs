//! Configuration file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the config file and hands out validated reloads
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Load the config and start watching it
    ///
    /// The parent directory is watched so editors that save by replacing the
    /// file keep triggering reloads.
    pub async fn new(config_path: impl AsRef<Path>) -> Result<(Self, AppConfig)> {
        let config_path = config_path.as_ref().to_path_buf();
        let initial = AppConfig::load_or_init(&config_path)
            .await
            .context("Failed to load initial config")?;

        let (tx, rx) = mpsc::channel(10);
        // Bumped by every file event; a reload only runs if no newer event came in
        let generation = Arc::new(AtomicU64::new(0));

        // notify callbacks run on their own OS thread, outside the Tokio context
        let runtime_handle = tokio::runtime::Handle::current();
        let watched = config_path.clone();
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Watch error: {}", e);
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                return;
            }
            debug!("Config file changed: {:?}", event.paths);

            let ticket = generation.fetch_add(1, Ordering::SeqCst) + 1;
            let generation = generation.clone();
            let path = watched.clone();
            let tx = tx.clone();
            runtime_handle.spawn(async move {
                tokio::time::sleep(DEBOUNCE).await;
                if generation.load(Ordering::SeqCst) != ticket {
                    return;
                }
                match AppConfig::load(&path).await {
                    Ok(config) => {
                        info!("Configuration reloaded successfully");
                        if let Err(e) = tx.send(config).await {
                            error!("Failed to send config update: {}", e);
                        }
                    }
                    Err(e) => warn!("Failed to reload config (keeping old config): {:#}", e),
                }
            });
        })?;

        let dir = parent_dir(&config_path);
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", dir.display()))?;
        info!("Config file watcher started for: {}", config_path.display());

        Ok((Self { _watcher: watcher, rx }, initial))
    }

    /// Wait for the next config update; `None` once the watcher is gone
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }

    /// Latest pending update without waiting
    pub fn try_next(&mut self) -> Option<AppConfig> {
        let mut latest = None;
        while let Ok(config) = self.rx.try_recv() {
            latest = Some(config);
        }
        latest
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
