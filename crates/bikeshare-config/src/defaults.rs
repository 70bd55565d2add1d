//! Default values for every configuration section.

use crate::schema::*;
use bikeshare_common::{BusinessQuestion, LogFormat, TimeFrame};
use std::path::PathBuf;

/// Default dataset file name, resolved against the working directory.
pub const DEFAULT_DATA_PATH: &str = "bike-sharing-dataset-cleaned.csv";

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "dashboard";

/// Default page title.
pub const DEFAULT_TITLE: &str = "Bike Sharing Analysis Dashboard";

/// Default categorical palette.
pub const DEFAULT_PALETTE: [&str; 14] = [
    "#4f7b3a", "#8fbf4d", "#f2c14e", "#3d5a80", "#e07a5f", "#81b29a", "#c9ada7",
    "#9a8c98", "#f4a261", "#2a9d8f", "#e9c46a", "#264653", "#b5838d", "#6d6875",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            dashboard: DashboardConfig::default(),
            styling: StylingConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            question: BusinessQuestion::RentalFactors,
            time_frame: TimeFrame::Hourly,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| (*c).to_string()).collect(),
            background_color: "#0e1117".to_string(),
            grid_color: "#1e2228".to_string(),
            text_color: "#8b949e".to_string(),
            font_family: "sans-serif".to_string(),
            chart_width: 600,
            chart_height: 400,
            wide_chart_width: 1200,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
            include_spans: false,
        }
    }
}
