/// Error types for SmokeStats.
///
/// Only dataset loading can fail. Filtering and the derivations are total:
/// an empty selection yields empty tables, and missing gender columns yield
/// an absent gender split, neither of which is an error.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// A required column is not present in the CSV header.
    #[error("schema error: required column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    /// The CSV header appears more than once for the same column name.
    #[error("schema error: column '{column}' appears more than once in the header")]
    DuplicateColumn { column: String },

    /// A required cell is empty or cannot be parsed as the expected type.
    #[error("row {row}: invalid value {value:?} in column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// The underlying CSV reader failed (bad quoting, ragged rows, ...).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value could not be used.
    #[error("config error: {message}")]
    Config { message: String },

    /// The data source could not be opened.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn missing_column(column: impl Into<String>, available: &[&str]) -> Self {
        DashboardError::MissingColumn {
            column: column.into(),
            available: available.join(", "),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        DashboardError::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DashboardError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors caused by the shape of the header rather than
    /// by the data rows.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DashboardError::MissingColumn { .. } | DashboardError::DuplicateColumn { .. }
        )
    }
}
