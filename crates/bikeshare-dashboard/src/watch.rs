//! Watch mode: re-run the dashboard whenever the configuration file changes.

use crate::app::{Dashboard, PassReport};
use crate::error::{AppError, AppResult};
use bikeshare_config::{Config, ConfigError, ConfigLoader};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Quiet period after a change before the pass starts. Editors often write a
/// file in several steps.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the directory of a configuration file for changes to that file.
///
/// The directory is watched rather than the file so that editors replacing
/// the file through a rename are still noticed.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<Event>,
    config_path: PathBuf,
}

impl ConfigWatcher {
    /// Starts watching `config_path`.
    pub fn new(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!(error = %e, "File watcher error"),
            }
        })?;

        let dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        debug!(dir = %dir.display(), "Watching configuration directory");

        Ok(Self {
            _watcher: watcher,
            events: rx,
            config_path,
        })
    }

    /// The watched configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Whether `event` is a write or creation of the configuration file.
    pub fn should_reload(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.config_path.file_name())
    }

    /// Waits for the next change of the configuration file.
    ///
    /// Events arriving within [`DEBOUNCE`] of the first are folded into it.
    /// Returns `None` once the watcher has shut down.
    pub async fn next_change(&mut self) -> Option<()> {
        loop {
            let event = self.events.recv().await?;
            if !self.should_reload(&event) {
                continue;
            }

            tokio::time::sleep(DEBOUNCE).await;
            while self.events.try_recv().is_ok() {}
            return Some(());
        }
    }
}

/// Re-reads the configuration file, applies `overrides` and runs a pass.
pub async fn rerun<F>(dashboard: &Arc<Dashboard>, config_path: &Path, overrides: F) -> AppResult<PassReport>
where
    F: Fn(&mut Config),
{
    let mut config = ConfigLoader::read_file(config_path)?;
    overrides(&mut config);
    config.validate().map_err(ConfigError::Validation)?;
    dashboard.reload(config);

    let dashboard = Arc::clone(dashboard);
    tokio::task::spawn_blocking(move || dashboard.run_pass()).await?
}

/// Runs passes on every configuration change until Ctrl+C.
///
/// Errors confined to one pass are logged and the loop waits for the next
/// change; watcher failures end the loop.
pub async fn watch<F>(dashboard: Arc<Dashboard>, config_path: PathBuf, overrides: F) -> AppResult<()>
where
    F: Fn(&mut Config),
{
    let mut watcher = ConfigWatcher::new(&config_path)?;
    info!(path = %config_path.display(), "Watching configuration for changes");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            change = watcher.next_change() => {
                if change.is_none() {
                    warn!("Configuration watcher stopped");
                    break;
                }
                match rerun(&dashboard, &config_path, &overrides).await {
                    Ok(report) => info!(
                        question = %report.question,
                        time_frame = %report.time_frame,
                        charts = report.charts,
                        "Dashboard updated"
                    ),
                    Err(e) if e.is_recoverable() => {
                        error!(error = %e, "Dashboard pass failed; waiting for the next change");
                    }
                    Err(e) => return Err(e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
