//! Error types for the merge engine.

use thiserror::Error;

/// Result type for merge engine operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors raised by caller-facing session operations.
///
/// Derivations (merge, reconcile, paging) never fail on valid session state;
/// these variants only describe rejected caller input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    /// No source is loaded under this name.
    #[error("Source not found: {name}")]
    SourceNotFound { name: String },

    /// The source exists but does not expose the column.
    #[error("Column '{column}' not found in source '{source_name}'")]
    ColumnNotFound { source_name: String, column: String },

    /// The column is not present in every loaded source.
    #[error("Column '{column}' is not shared by all sources")]
    ColumnNotShared { column: String },

    /// Pages must hold at least one row.
    #[error("Invalid page size: {0}")]
    InvalidPageSize(usize),

    /// A configuration value could not be applied.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl MergeError {
    /// Create a source-not-found error.
    pub fn source_not_found(name: impl Into<String>) -> Self {
        Self::SourceNotFound { name: name.into() }
    }

    /// Create a column-not-found error.
    pub fn column_not_found(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            source_name: source_name.into(),
            column: column.into(),
        }
    }
}
