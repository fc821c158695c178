//! Links file watcher for reload-on-change support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Delay before signalling a change, so the writer can finish
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the links file and signals when it has been modified
///
/// The file is watched through its parent directory so editors that replace
/// the file (write to temp, rename) are still seen.
pub struct LinksWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<PathBuf>,
}

impl LinksWatcher {
    /// Create a watcher for the specified links file
    pub fn new(links_path: impl AsRef<Path>) -> Result<Self> {
        let (tx, rx) = mpsc::channel(10);

        let links_path = links_path.as_ref().to_path_buf();
        let file_name = links_path
            .file_name()
            .map(|n| n.to_os_string())
            .with_context(|| format!("Not a file path: {}", links_path.display()))?;
        let dir = match links_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Capture the Tokio runtime handle BEFORE creating the watcher
        // (notify callbacks run on their own OS thread, not in Tokio context)
        let runtime_handle = tokio::runtime::Handle::current();
        let watched = links_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if !relevant {
                        return;
                    }

                    debug!("Links file changed: {:?}", event.paths);
                    let tx = tx.clone();
                    let path = watched.clone();

                    runtime_handle.spawn(async move {
                        tokio::time::sleep(DEBOUNCE).await;
                        // A full channel already has a reload pending
                        let _ = tx.try_send(path);
                    });
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        info!("Links file watcher started for: {}", links_path.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next change notification
    /// Returns None if the watcher has been closed
    pub async fn next_change(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}
