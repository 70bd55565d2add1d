//! Application-wide error types using thiserror.

use bikeshare_common::DashboardError;
use bikeshare_config::ConfigError;
use std::path::PathBuf;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Dataset, column or chart error from a pass.
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// Configuration loading error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing an output file failed.
    #[error("Failed to write '{path}': {source}")]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File watcher error.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// `view.json` serialization error.
    #[error("Failed to serialize view: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A pass running on the blocking pool panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether watch mode can carry on after this error.
    ///
    /// A broken config edit or an unplottable selection only spoils the
    /// current pass; the next file change gets a fresh one.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Dashboard(err) => err.is_pass_local(),
            Self::Config(_) | Self::Io { .. } | Self::Serialization(_) => true,
            Self::Watch(_) | Self::Task(_) => false,
        }
    }
}

/// Result type for the dashboard application.
pub type AppResult<T> = Result<T, AppError>;
