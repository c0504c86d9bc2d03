//! Worksheet listing and PDF export for ReviAI.
//!
//! PDF export drives a real Excel instance through a COM bridge process,
//! communicating over JSON-over-stdio. On Windows the bridge runs natively;
//! elsewhere it runs under WINE.
//!
//! # Architecture
//!
//! ```text
//! generate_pdfs (this crate)
//!     └── SheetExporter
//!           └── ExcelExporter
//!                 └── ExcelBridge ── spawns: [wine] excel-com-bridge.exe
//!                                          └── COM: Excel.Application
//! ```
//!
//! Sheet names of `.xlsx`/`.xlsm` workbooks are read directly from the
//! archive, so listing sheets does not need Excel.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use reviai_excel::{generate_pdfs, ExcelExporter, ExcelBridgeConfig, PdfRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut exporter = ExcelExporter::new(ExcelBridgeConfig::default());
//!     let sheets = vec!["画面一覧".to_string()];
//!     let request = PdfRequest::new(Path::new("設計書.xlsx"), &sheets, 6, Path::new("output/pdfs"));
//!     for pdf in generate_pdfs(&mut exporter, &request)? {
//!         println!("{}", pdf.display());
//!     }
//!     Ok(())
//! }
//! ```

mod bridge;
pub mod error;
mod export;
mod workbook;
pub mod xlsx;

pub use bridge::{linux_to_wine_path, BridgeError, BridgeLauncher, ExcelBridge, ExcelBridgeConfig};
pub use error::{ExportError, ExportResult};
pub use excel_com_protocol::PageSetup;
pub use export::{generate_pdfs, list_sheets, ExcelExporter, PdfRequest, SheetExporter, SheetJob};
pub use workbook::Workbook;
