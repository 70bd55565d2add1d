//! Runtime validation of a loaded configuration.

use crate::schema::Config;
use bikeshare_common::{DashboardError, Result};

/// Smallest chart edge that still leaves room for axes and a caption.
pub const MIN_CHART_EDGE: u32 = 200;

/// Largest chart edge accepted.
pub const MAX_CHART_EDGE: u32 = 4000;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if config.data.path.as_os_str().is_empty() {
            return Err(DashboardError::validation_field(
                "dataset path cannot be empty",
                "data.path",
            ));
        }

        if config.dashboard.output_dir.as_os_str().is_empty() {
            return Err(DashboardError::validation_field(
                "output directory cannot be empty",
                "dashboard.output_dir",
            ));
        }

        let styling = &config.styling;
        // The user pattern charts need the comparison pair at palette[1..3].
        if styling.palette.len() < 3 {
            return Err(DashboardError::validation_field(
                format!(
                    "palette needs at least 3 colors, got {}",
                    styling.palette.len()
                ),
                "styling.palette",
            ));
        }

        for (idx, color) in styling.palette.iter().enumerate() {
            if !is_hex_color(color) {
                return Err(DashboardError::validation_field(
                    format!("'{color}' is not a #RRGGBB color"),
                    format!("styling.palette[{idx}]"),
                ));
            }
        }

        for (field, color) in [
            ("styling.background_color", &styling.background_color),
            ("styling.grid_color", &styling.grid_color),
            ("styling.text_color", &styling.text_color),
        ] {
            if !is_hex_color(color) {
                return Err(DashboardError::validation_field(
                    format!("'{color}' is not a #RRGGBB color"),
                    field,
                ));
            }
        }

        for (field, edge) in [
            ("styling.chart_width", styling.chart_width),
            ("styling.chart_height", styling.chart_height),
            ("styling.wide_chart_width", styling.wide_chart_width),
        ] {
            if !(MIN_CHART_EDGE..=MAX_CHART_EDGE).contains(&edge) {
                return Err(DashboardError::validation_field(
                    format!("{edge} must be between {MIN_CHART_EDGE} and {MAX_CHART_EDGE} pixels"),
                    field,
                ));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate(self)
    }
}

/// Whether `value` is a `#RRGGBB` hex color.
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#0e1117"));
        assert!(is_hex_color("#FFFFFF"));
        assert!(!is_hex_color("0e1117"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#zz1117"));
    }

    #[test]
    fn test_short_palette_rejected() {
        let mut config = Config::default();
        config.styling.palette.truncate(2);
        let err = config.validate().unwrap_err();
        match err {
            DashboardError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("styling.palette"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_palette_entry_names_index() {
        let mut config = Config::default();
        config.styling.palette[4] = "teal".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'teal' is not a #RRGGBB color"));
    }

    #[test]
    fn test_chart_dimensions_bounded() {
        let mut config = Config::default();
        config.styling.chart_height = 50;
        assert!(config.validate().is_err());
        config.styling.chart_height = 400;
        config.styling.wide_chart_width = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_data_path_rejected() {
        let mut config = Config::default();
        config.data.path = std::path::PathBuf::new();
        assert!(config.validate().is_err());
    }
}
