//! Error taxonomy of the series pipeline.
//!
//! Everything above the pipeline works in `anyhow::Result`; these variants
//! convert into `anyhow::Error` with `?` and can be downcast back when a caller
//! wants to react to a specific failure.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("window size must be at least 1, got {0}")]
    InvalidWindowSize(usize),

    #[error("missing column '{column}' ({location})")]
    MissingColumn { column: String, location: String },

    #[error("no rows for operation '{operation}' on dataset '{dataset}' with classifier '{classifier}'")]
    EmptyFilterResult {
        operation: String,
        dataset: String,
        classifier: String,
    },

    #[error("dataset '{0}' does not occur in the table")]
    UnknownDataset(String),

    #[error("operation '{0}' does not occur in the table")]
    UnknownOperation(String),
}

impl SeriesError {
    pub fn missing_column(column: &str, location: impl Into<String>) -> Self {
        SeriesError::MissingColumn {
            column: column.to_string(),
            location: location.into(),
        }
    }

    /// True for failures that only concern one (operation, dataset) pair.
    pub fn is_per_key(&self) -> bool {
        matches!(self, SeriesError::EmptyFilterResult { .. })
    }
}
