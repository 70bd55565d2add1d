//! Error types and utilities for the dashboard

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed dataset contents
    #[error("Dataset error: {message}")]
    Data {
        /// Human readable description
        message: String,
    },

    /// A column required by a chart is not present in the dataset
    #[error("Column '{column}' not found in dataset")]
    MissingColumn {
        /// Name of the missing column
        column: String,
    },

    /// A column that must hold numbers holds text
    #[error("Column '{column}' is not numeric")]
    NonNumericColumn {
        /// Name of the offending column
        column: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Graph generation and plotting errors
    #[error("Graph error: {message}")]
    Graph {
        /// Human readable description
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for user input
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending field, if known
        field: Option<String>,
    },
}

impl DashboardError {
    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new dataset error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data {
            message: msg.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create a non-numeric column error
    pub fn non_numeric_column(column: impl Into<String>) -> Self {
        Self::NonNumericColumn {
            column: column.into(),
        }
    }

    /// Create a new graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new graph error with source
    pub fn graph_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Graph {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error for a specific field
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Whether the error aborts only the current render pass.
    ///
    /// Data, column and plotting failures leave the process usable; the next
    /// selection change starts a fresh pass.
    pub const fn is_pass_local(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::NonNumericColumn { .. }
                | Self::Data { .. }
                | Self::Graph { .. }
        )
    }
}

#[cfg(feature = "plotters")]
impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for DashboardError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Self::graph_with_source("Failed to draw chart", err)
    }
}
