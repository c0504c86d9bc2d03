//! PDF generation step: selected worksheets → one PDF per sheet.

use std::path::{Path, PathBuf};

use excel_com_protocol::PageSetup;
use reviai_core::naming::pdf_file_name;

use crate::bridge::{ExcelBridge, ExcelBridgeConfig};
use crate::error::{ExportError, ExportResult};
use crate::xlsx;

/// One sheet to export and where its PDF goes.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetJob {
    pub sheet: String,
    pub output: PathBuf,
}

/// Something that can read sheet names from a workbook and export sheets as PDF.
pub trait SheetExporter {
    /// Worksheet names in workbook order.
    fn sheet_names(&mut self, workbook: &Path) -> ExportResult<Vec<String>>;

    /// Export each job, returning one result per job in the same order.
    ///
    /// An outer error means the workbook itself could not be processed.
    fn export_sheets(
        &mut self,
        workbook: &Path,
        jobs: &[SheetJob],
        page_setup: &PageSetup,
    ) -> ExportResult<Vec<ExportResult<()>>>;
}

/// [`SheetExporter`] backed by Excel through the COM bridge.
///
/// Every call starts its own bridge session and shuts it down afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExcelExporter {
    config: ExcelBridgeConfig,
}

impl ExcelExporter {
    pub fn new(config: ExcelBridgeConfig) -> Self {
        Self { config }
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&ExcelBridge) -> ExportResult<T>,
    ) -> ExportResult<T> {
        let bridge = ExcelBridge::start(self.config.clone())?;
        let result = f(&bridge);
        if let Err(e) = bridge.shutdown() {
            tracing::warn!("Excel bridge shutdown failed: {}", e);
        }
        result
    }
}

impl SheetExporter for ExcelExporter {
    fn sheet_names(&mut self, workbook: &Path) -> ExportResult<Vec<String>> {
        self.with_session(|bridge| {
            let wb = bridge.open_workbook(workbook)?;
            let names = wb.sheet_names()?;
            wb.close()?;
            Ok(names)
        })
    }

    fn export_sheets(
        &mut self,
        workbook: &Path,
        jobs: &[SheetJob],
        page_setup: &PageSetup,
    ) -> ExportResult<Vec<ExportResult<()>>> {
        self.with_session(|bridge| {
            let wb = bridge.open_workbook(workbook)?;
            let results = jobs
                .iter()
                .map(|job| {
                    tracing::debug!("Exporting sheet '{}' to {}", job.sheet, job.output.display());
                    wb.export_pdf(&job.sheet, &job.output, page_setup)
                        .map_err(ExportError::from)
                })
                .collect();
            if let Err(e) = wb.close() {
                tracing::warn!("Failed to close workbook: {}", e);
            }
            Ok(results)
        })
    }
}

/// Parameters of one PDF generation run.
#[derive(Debug, Clone)]
pub struct PdfRequest {
    pub workbook: PathBuf,
    pub sheets: Vec<String>,
    /// Document version, used in output file names (`_V{n}`).
    pub version: u32,
    pub output_dir: PathBuf,
    pub page_setup: PageSetup,
}

impl PdfRequest {
    pub fn new(workbook: &Path, sheets: &[String], version: u32, output_dir: &Path) -> Self {
        Self {
            workbook: workbook.to_path_buf(),
            sheets: sheets.to_vec(),
            version,
            output_dir: output_dir.to_path_buf(),
            page_setup: PageSetup::default(),
        }
    }

    fn workbook_stem(&self) -> String {
        self.workbook
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Worksheet names of a workbook.
///
/// OOXML workbooks are read directly; other formats go through `exporter`.
pub fn list_sheets(path: &Path, exporter: &mut dyn SheetExporter) -> ExportResult<Vec<String>> {
    if !path.exists() {
        return Err(ExportError::NotFound(path.to_path_buf()));
    }
    if xlsx::is_ooxml(path) {
        xlsx::list_sheets_xlsx(path)
    } else {
        exporter.sheet_names(path)
    }
}

/// Export the requested sheets to PDF.
///
/// Returns the generated files in request order. Sheets that fail to export
/// are logged and skipped; the call only fails when none succeed.
pub fn generate_pdfs(
    exporter: &mut dyn SheetExporter,
    request: &PdfRequest,
) -> ExportResult<Vec<PathBuf>> {
    if !request.workbook.exists() {
        return Err(ExportError::NotFound(request.workbook.clone()));
    }
    if request.sheets.is_empty() {
        return Err(ExportError::NoSheetsSelected);
    }

    std::fs::create_dir_all(&request.output_dir)?;

    let available = list_sheets(&request.workbook, exporter)?;
    if let Some(missing) = request.sheets.iter().find(|s| !available.contains(s)) {
        return Err(ExportError::SheetNotFound(missing.clone()));
    }

    let stem = request.workbook_stem();
    let jobs: Vec<SheetJob> = request
        .sheets
        .iter()
        .map(|sheet| SheetJob {
            sheet: sheet.clone(),
            output: request
                .output_dir
                .join(pdf_file_name(&stem, sheet, request.version)),
        })
        .collect();

    tracing::info!(
        "Exporting {} sheet(s) from {}",
        jobs.len(),
        request.workbook.display()
    );
    let results = exporter.export_sheets(&request.workbook, &jobs, &request.page_setup)?;

    let mut generated = Vec::new();
    for (job, result) in jobs.into_iter().zip(results) {
        match result {
            Ok(()) => {
                tracing::info!("Generated: {}", job.output.display());
                generated.push(job.output);
            }
            Err(e) => tracing::error!("Failed to export sheet '{}': {}", job.sheet, e),
        }
    }

    tracing::info!("Generated {}/{} files", generated.len(), request.sheets.len());

    if generated.is_empty() {
        return Err(ExportError::NothingExported(request.sheets.len()));
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Writes a placeholder PDF for every sheet not listed in `fail`.
    struct FakeExporter {
        sheets: Vec<String>,
        fail: Vec<String>,
        exported: Vec<SheetJob>,
        listed: usize,
    }

    impl FakeExporter {
        fn new(sheets: &[&str]) -> Self {
            Self {
                sheets: sheets.iter().map(|s| s.to_string()).collect(),
                fail: Vec::new(),
                exported: Vec::new(),
                listed: 0,
            }
        }
    }

    impl SheetExporter for FakeExporter {
        fn sheet_names(&mut self, _workbook: &Path) -> ExportResult<Vec<String>> {
            self.listed += 1;
            Ok(self.sheets.clone())
        }

        fn export_sheets(
            &mut self,
            _workbook: &Path,
            jobs: &[SheetJob],
            _page_setup: &PageSetup,
        ) -> ExportResult<Vec<ExportResult<()>>> {
            Ok(jobs
                .iter()
                .map(|job| {
                    if self.fail.contains(&job.sheet) {
                        return Err(ExportError::Bridge(crate::BridgeError::Excel(
                            "ExportAsFixedFormat failed".into(),
                        )));
                    }
                    std::fs::write(&job.output, b"%PDF-1.4")?;
                    self.exported.push(job.clone());
                    Ok(())
                })
                .collect())
        }
    }

    fn workbook(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"not inspected by the fake").unwrap();
        path
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generates_one_pdf_per_sheet_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let wb = workbook(dir.path(), "設計書.xls");
        let out = dir.path().join("pdfs");
        let mut exporter = FakeExporter::new(&["表紙", "画面一覧", "帳票"]);

        let request = PdfRequest::new(&wb, &names(&["帳票", "表紙"]), 7, &out);
        let generated = generate_pdfs(&mut exporter, &request).unwrap();

        assert_eq!(
            generated,
            vec![out.join("設計書_帳票_V7.pdf"), out.join("設計書_表紙_V7.pdf")]
        );
        assert!(generated.iter().all(|p| p.exists()));
        assert_eq!(exporter.listed, 1);
    }

    #[test]
    fn test_missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FakeExporter::new(&["A"]);
        let request = PdfRequest::new(&dir.path().join("none.xls"), &names(&["A"]), 1, dir.path());

        assert!(matches!(
            generate_pdfs(&mut exporter, &request),
            Err(ExportError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let wb = workbook(dir.path(), "book.xls");
        let mut exporter = FakeExporter::new(&["A"]);
        let request = PdfRequest::new(&wb, &[], 1, dir.path());

        assert!(matches!(
            generate_pdfs(&mut exporter, &request),
            Err(ExportError::NoSheetsSelected)
        ));
    }

    #[test]
    fn test_unknown_sheet_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let wb = workbook(dir.path(), "book.xls");
        let mut exporter = FakeExporter::new(&["A", "B"]);
        let request = PdfRequest::new(&wb, &names(&["A", "Z"]), 1, dir.path());

        match generate_pdfs(&mut exporter, &request) {
            Err(ExportError::SheetNotFound(name)) => assert_eq!(name, "Z"),
            other => panic!("expected SheetNotFound, got {:?}", other),
        }
        assert!(exporter.exported.is_empty());
    }

    #[test]
    fn test_partial_failure_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let wb = workbook(dir.path(), "book.xls");
        let mut exporter = FakeExporter::new(&["A", "B", "C"]);
        exporter.fail.push("B".into());

        let request = PdfRequest::new(&wb, &names(&["A", "B", "C"]), 2, dir.path());
        let generated = generate_pdfs(&mut exporter, &request).unwrap();

        assert_eq!(
            generated,
            vec![dir.path().join("book_A_V2.pdf"), dir.path().join("book_C_V2.pdf")]
        );
    }

    #[test]
    fn test_all_failed() {
        let dir = tempfile::tempdir().unwrap();
        let wb = workbook(dir.path(), "book.xls");
        let mut exporter = FakeExporter::new(&["A", "B"]);
        exporter.fail = names(&["A", "B"]);

        let request = PdfRequest::new(&wb, &names(&["A", "B"]), 1, dir.path());
        assert!(matches!(
            generate_pdfs(&mut exporter, &request),
            Err(ExportError::NothingExported(2))
        ));
    }

    #[test]
    fn test_default_page_setup() {
        let request = PdfRequest::new(Path::new("a.xlsx"), &names(&["A"]), 1, Path::new("out"));
        assert!(request.page_setup.landscape);
        assert_eq!(request.page_setup.fit_to_pages_wide, 1);
    }
}
