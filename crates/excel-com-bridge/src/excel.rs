//! Excel object-model operations used by the export bridge.

#![cfg(windows)]

use std::collections::BTreeMap;

use excel_com_protocol::PageSetup;

use crate::dispatch::{as_f64, as_i32, as_string, Arg, Dispatch};

// XlPageOrientation
const PORTRAIT: i32 = 1;
const LANDSCAPE: i32 = 2;
// XlFixedFormatType
const FORMAT_PDF: i32 = 0;
// XlUpdateLinks
const NEVER_UPDATE_LINKS: i32 = 0;

/// A hidden Excel.Application instance and the workbooks it has open.
pub struct ExcelApp {
    app: Dispatch,
    open: BTreeMap<u64, Dispatch>,
    last_handle: u64,
}

impl ExcelApp {
    pub fn new() -> Result<Self, String> {
        let app = Dispatch::create("Excel.Application")?;
        for property in ["Visible", "DisplayAlerts", "ScreenUpdating"] {
            app.put(property, Arg::Bool(false))?;
        }
        Ok(Self {
            app,
            open: BTreeMap::new(),
            last_handle: 0,
        })
    }

    /// Opens read-only without refreshing external links.
    pub fn open_workbook(&mut self, path: &str) -> Result<u64, String> {
        let workbook = self.app.object("Workbooks")?.call_object(
            "Open",
            &[Arg::Str(path), Arg::Int(NEVER_UPDATE_LINKS), Arg::Bool(true)],
        )?;
        self.last_handle += 1;
        self.open.insert(self.last_handle, workbook);
        crate::log(&format!("workbook #{} <- {path}", self.last_handle));
        Ok(self.last_handle)
    }

    fn worksheets(&self, handle: u64) -> Result<Dispatch, String> {
        self.open
            .get(&handle)
            .ok_or_else(|| format!("No open workbook #{handle}"))?
            .object("Worksheets")
    }

    pub fn sheet_names(&self, handle: u64) -> Result<Vec<String>, String> {
        let sheets = self.worksheets(handle)?;
        let count = as_i32(&sheets.get("Count")?).ok_or("Worksheets.Count is not numeric")?;

        let mut names = Vec::with_capacity(count.max(0) as usize);
        for index in 1..=count {
            let name = sheets.item(Arg::Int(index))?.get("Name")?;
            names.push(as_string(&name).ok_or_else(|| format!("Worksheet {index} has no name"))?);
        }
        Ok(names)
    }

    pub fn export_sheet_pdf(
        &self,
        handle: u64,
        sheet: &str,
        path: &str,
        setup: &PageSetup,
    ) -> Result<(), String> {
        let worksheet = self
            .worksheets(handle)?
            .item(Arg::Str(sheet))
            .map_err(|e| format!("Sheet '{sheet}' not found: {e}"))?;

        self.apply_page_setup(&worksheet.object("PageSetup")?, setup)?;
        worksheet.call("ExportAsFixedFormat", &[Arg::Int(FORMAT_PDF), Arg::Str(path)])?;
        crate::log(&format!("'{sheet}' -> {path}"));
        Ok(())
    }

    fn apply_page_setup(&self, page: &Dispatch, setup: &PageSetup) -> Result<(), String> {
        let orientation = if setup.landscape { LANDSCAPE } else { PORTRAIT };
        page.put("Orientation", Arg::Int(orientation))?;
        // FitToPages* is ignored while Zoom is set
        page.put("Zoom", Arg::Bool(false))?;
        page.put("FitToPagesWide", Arg::Int(setup.fit_to_pages_wide as i32))?;
        page.put("FitToPagesTall", Arg::Bool(false))?;

        for (property, inches) in [
            ("LeftMargin", setup.left_margin),
            ("RightMargin", setup.right_margin),
            ("TopMargin", setup.top_margin),
            ("BottomMargin", setup.bottom_margin),
            ("HeaderMargin", setup.header_margin),
            ("FooterMargin", setup.footer_margin),
        ] {
            let points = self.app.call("InchesToPoints", &[Arg::Float(inches)])?;
            let points = as_f64(&points).unwrap_or(inches * 72.0);
            page.put(property, Arg::Float(points))?;
        }
        Ok(())
    }

    pub fn close_workbook(&mut self, handle: u64) -> Result<(), String> {
        let workbook = self
            .open
            .remove(&handle)
            .ok_or_else(|| format!("No open workbook #{handle}"))?;
        workbook.call("Close", &[Arg::Bool(false)]).map(drop)
    }

    /// Closes whatever is still open, then quits Excel.
    pub fn shutdown(mut self) -> Result<(), String> {
        while let Some(handle) = self.open.keys().next().copied() {
            if let Err(e) = self.close_workbook(handle) {
                crate::log(&format!("closing workbook #{handle}: {e}"));
            }
        }
        self.app.call("Quit", &[]).map(drop)
    }
}
