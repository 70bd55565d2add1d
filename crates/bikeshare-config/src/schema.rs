//! Configuration schema definitions using serde.

use bikeshare_common::{BusinessQuestion, LogFormat, LoggingConfig, TimeFrame};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset location.
    pub data: DataConfig,
    /// Selections and output.
    pub dashboard: DashboardConfig,
    /// Chart styling.
    pub styling: StylingConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Dataset configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the cleaned bike sharing CSV file.
    pub path: PathBuf,
}

/// The two dashboard controls plus page settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Business question whose charts are shown.
    pub question: BusinessQuestion,
    /// Hourly or daily rental counts.
    pub time_frame: TimeFrame,
    /// Directory receiving `index.html`, the chart SVGs and `view.json`.
    pub output_dir: PathBuf,
    /// Page title.
    pub title: String,
}

/// Styling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylingConfig {
    /// Categorical palette (hex colors). The first entry colors single-series
    /// charts, entries two and three the casual/registered comparison.
    pub palette: Vec<String>,
    /// Chart and page background color.
    pub background_color: String,
    /// Grid line color.
    pub grid_color: String,
    /// Axis, label and caption color.
    pub text_color: String,
    /// Font family for chart text.
    pub font_family: String,
    /// Width of a regular chart in pixels.
    pub chart_width: u32,
    /// Height of a regular chart in pixels.
    pub chart_height: u32,
    /// Width of full-row charts (histogram, weekday tabs) in pixels.
    pub wide_chart_width: u32,
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level filter, overridden by `RUST_LOG`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file.
    pub file: Option<String>,
    /// Whether span open/close events are logged.
    pub include_spans: bool,
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format,
            file_path: settings.file.clone(),
            include_spans: settings.include_spans,
            ..Self::default()
        }
    }
}
