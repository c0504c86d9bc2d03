//! Report error types

use thiserror::Error;

/// Result type for report operations
pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while writing the result workbook
#[derive(Debug, Error)]
pub enum ReportError {
    /// Nothing to write
    #[error("Review table is empty. No data to save.")]
    EmptyTable,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
