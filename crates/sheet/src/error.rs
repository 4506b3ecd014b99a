use sheetmerge_core::MergeError;
use thiserror::Error;

/// Errors that can occur while reading, loading or exporting spreadsheets
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Cannot read '{file}' as a spreadsheet: {message}")]
    Format { file: String, message: String },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Ingestion of '{file}' did not complete: {message}")]
    Task { file: String, message: String },

    #[error("Loading was cancelled")]
    Cancelled,

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Create a format error for one file
    pub fn format(file: impl Into<String>, message: impl ToString) -> Self {
        SheetError::Format {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Create an export error
    pub fn export(message: impl ToString) -> Self {
        SheetError::Export(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
