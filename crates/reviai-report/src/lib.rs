//! Formatted review result workbooks.
//!
//! The review table is written to a single-sheet XLSX file with a styled
//! header row, bordered and wrapped data cells, an auto filter and column
//! widths fitted to the content.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use reviai_core::ReviewTable;
//!
//! let table = ReviewTable::from_json_file(Path::new("output/review.json")).unwrap();
//! let path = reviai_report::save_review_workbook(&table, 6, Path::new("output/results")).unwrap();
//! assert!(path.ends_with("第六回.xlsx"));
//! ```

pub mod error;
mod styles;
mod writer;

pub use error::{ReportError, ReportResult};
pub use writer::{save_review_workbook, write_review_workbook, SHEET_NAME};
