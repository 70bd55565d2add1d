//! Dashboard application state and the render pass.

use crate::error::AppResult;
use crate::page::{write_outputs, OutputFiles};
use bikeshare_common::{BusinessQuestion, TimeFrame};
use bikeshare_config::{Config, ConfigCache};
use bikeshare_graphs::{ChartRenderer, ChartStyle, Dataset, GraphManager, SvgRenderer};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Summary of a finished pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Question the pass answered
    pub question: BusinessQuestion,
    /// Time frame of the pass
    pub time_frame: TimeFrame,
    /// Charts rendered
    pub charts: usize,
    /// Metric callouts shown
    pub metrics: usize,
    /// Files written
    pub files: OutputFiles,
}

/// Loaded dataset plus the current configuration.
///
/// The dataset is read once and never mutated; every pass re-reads the
/// configuration from the cache so a reload takes effect on the next pass.
pub struct Dashboard {
    dataset: Dataset,
    cache: ConfigCache,
}

impl Dashboard {
    /// Loads the dataset named by `config.data.path`.
    #[instrument(skip(config), fields(path = %config.data.path.display()))]
    pub fn load(config: Config) -> AppResult<Self> {
        let dataset = Dataset::from_path(&config.data.path)?;
        Ok(Self::with_dataset(config, dataset))
    }

    /// Wraps an already loaded dataset.
    pub fn with_dataset(config: Config, dataset: Dataset) -> Self {
        Self {
            dataset,
            cache: ConfigCache::new(config),
        }
    }

    /// The dataset shared by every pass.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The configuration the next pass will use.
    pub fn config(&self) -> Arc<Config> {
        self.cache.get()
    }

    /// Replaces the configuration. Returns whether the selection changed.
    pub fn reload(&self, config: Config) -> bool {
        let previous = self.cache.update(config);
        let current = self.cache.get();

        if previous.data.path != current.data.path {
            warn!(
                old = %previous.data.path.display(),
                new = %current.data.path.display(),
                "Dataset path changed; restart to load the new file"
            );
        }

        let changed = previous.dashboard.question != current.dashboard.question
            || previous.dashboard.time_frame != current.dashboard.time_frame;
        info!(
            question = %current.dashboard.question,
            time_frame = %current.dashboard.time_frame,
            changed,
            "Configuration reloaded"
        );
        changed
    }

    /// Runs a pass with the SVG renderer styled from the current config.
    pub fn run_pass(&self) -> AppResult<PassReport> {
        let config = self.cache.get();
        self.run_pass_with(SvgRenderer::new(ChartStyle::from(&config.styling)))
    }

    /// Runs a complete pass for the current selection and writes its output.
    #[instrument(skip_all)]
    pub fn run_pass_with(&self, renderer: impl ChartRenderer + 'static) -> AppResult<PassReport> {
        let config = self.cache.get();
        let (question, time_frame) = self.cache.selection();
        let extension = renderer.file_extension();

        let manager = GraphManager::new(renderer);
        let view = manager.build_view(&self.dataset, question, time_frame)?;
        let files = write_outputs(
            &config.dashboard.output_dir,
            &config.dashboard.title,
            &view,
            extension,
        )?;

        Ok(PassReport {
            question,
            time_frame,
            charts: view.charts.len(),
            metrics: view.metrics.len(),
            files,
        })
    }
}
