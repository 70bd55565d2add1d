//! Configuration loading from TOML files with environment variable overrides.

use crate::schema::Config;
use bikeshare_common::{DashboardError, LogFormat};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "BIKESHARE_CONFIG";

/// Configuration file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "bikeshare.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading or writing a configuration file
    #[error("Failed to access configuration file '{path}': {source}")]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(#[source] DashboardError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Explicitly requested configuration file does not exist
    #[error("Configuration file not found: {0}")]
    Missing(PathBuf),
}

impl From<ConfigError> for DashboardError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(inner) => inner,
            other => Self::config_with_source(other.to_string(), other),
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file, apply environment overrides and validate.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Read a TOML file and apply environment overrides, leaving validation
    /// to the caller so later layers can still replace file values.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        Self::apply_env_overrides(&mut config)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text without overrides or validation.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from the first available source and validate it.
    ///
    /// Order: the explicit path, `BIKESHARE_CONFIG`, `bikeshare.toml` in the
    /// working directory, and finally built-in defaults. Environment
    /// overrides apply in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let config = Self::read(explicit)?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Like [`ConfigLoader::load`] without the final validation.
    pub fn read(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = Self::locate(explicit) {
            return Self::read_file(path);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// The configuration file [`ConfigLoader::load`] would read, if any.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.exists().then(|| default.to_path_buf())
    }

    /// Render a configuration as TOML text.
    pub fn to_toml(config: &Config) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(config)?)
    }

    /// Serialize a configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = Self::to_toml(config)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `BIKESHARE_*` environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |var| env::var(var).ok())
    }

    /// Apply overrides taken from an arbitrary variable lookup.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BIKESHARE_DATA_PATH") {
            config.data.path = PathBuf::from(path);
        }

        if let Some(question) = lookup("BIKESHARE_QUESTION") {
            config.dashboard.question = parse_var("BIKESHARE_QUESTION", &question)?;
        }

        if let Some(time_frame) = lookup("BIKESHARE_TIME_FRAME") {
            config.dashboard.time_frame = parse_var("BIKESHARE_TIME_FRAME", &time_frame)?;
        }

        if let Some(dir) = lookup("BIKESHARE_OUTPUT_DIR") {
            config.dashboard.output_dir = PathBuf::from(dir);
        }

        if let Some(width) = lookup("BIKESHARE_CHART_WIDTH") {
            config.styling.chart_width = parse_var("BIKESHARE_CHART_WIDTH", &width)?;
        }

        if let Some(height) = lookup("BIKESHARE_CHART_HEIGHT") {
            config.styling.chart_height = parse_var("BIKESHARE_CHART_HEIGHT", &height)?;
        }

        if let Some(level) = lookup("BIKESHARE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(format) = lookup("BIKESHARE_LOG_FORMAT") {
            config.logging.format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "compact" => LogFormat::Compact,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::EnvParse {
                        var: "BIKESHARE_LOG_FORMAT".to_string(),
                        source: format!("unknown log format '{other}'").into(),
                    })
                }
            };
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParse {
        var: var.to_string(),
        source: Box::new(e),
    })
}
