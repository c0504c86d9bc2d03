//! A workbook opened in Excel through the bridge.

use std::path::Path;

use excel_com_protocol::PageSetup;

use crate::bridge::{BridgeError, ExcelBridge};

/// A handle to an open workbook in the Excel COM bridge.
pub struct Workbook<'a> {
    bridge: &'a ExcelBridge,
    handle: u64,
}

impl<'a> Workbook<'a> {
    pub(crate) fn new(bridge: &'a ExcelBridge, handle: u64) -> Self {
        Self { bridge, handle }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Worksheet names in workbook order.
    pub fn sheet_names(&self) -> Result<Vec<String>, BridgeError> {
        self.bridge.list_sheets(self.handle)
    }

    /// Export one worksheet to a PDF file after applying the page setup.
    pub fn export_pdf(
        &self,
        sheet: &str,
        path: &Path,
        page_setup: &PageSetup,
    ) -> Result<(), BridgeError> {
        self.bridge
            .export_sheet_pdf(self.handle, sheet, path, page_setup)
    }

    /// Close the workbook without saving.
    pub fn close(self) -> Result<(), BridgeError> {
        self.bridge.close_workbook(self.handle)
    }
}
