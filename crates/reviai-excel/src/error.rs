//! Export error types

use std::path::PathBuf;

use thiserror::Error;

use crate::bridge::BridgeError;

/// Result type for listing and export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while listing sheets or exporting PDFs
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook file does not exist
    #[error("Excel file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No sheets were requested
    #[error("No sheets selected for export")]
    NoSheetsSelected,

    /// A requested sheet is not in the workbook
    #[error("Sheet '{0}' not found in Excel file")]
    SheetNotFound(String),

    /// Every requested sheet failed to export
    #[error("PDF generation failed for all {0} sheets")]
    NothingExported(usize),

    /// Excel automation error
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required workbook part
    #[error("Missing required part: {0}")]
    MissingPart(String),
}
