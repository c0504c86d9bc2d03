//! Shared protocol types for communication between the ReviAI client and
//! the Windows COM bridge process (run natively on Windows or under WINE).
//!
//! Each message is a single line of JSON; requests travel on the bridge's
//! stdin and responses come back on its stdout in the same order.

use serde::{Deserialize, Serialize};

/// A command sent from the client to the bridge process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Echoed back in the matching [`Response`].
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// What the bridge should do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and create a hidden Excel.Application instance.
    Init,

    /// Open an existing workbook read-only (path as seen by the bridge).
    OpenWorkbook { path: String },

    /// List worksheet names of an open workbook, in workbook order.
    ListSheets { workbook: u64 },

    /// Apply a page setup to a worksheet and export it as PDF.
    ExportSheetPdf {
        workbook: u64,
        sheet: String,
        path: String,
        page_setup: PageSetup,
    },

    /// Discard a workbook handle, closing it without saving.
    CloseWorkbook { workbook: u64 },

    /// Quit Excel (closing anything still open) and end the process.
    Shutdown,
}

/// Worksheet page setup applied before PDF export. Margins are in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub landscape: bool,
    /// Number of pages all columns must fit into. Height is unbounded.
    pub fit_to_pages_wide: u32,
    pub left_margin: f64,
    pub right_margin: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub header_margin: f64,
    pub footer_margin: f64,
}

impl Default for PageSetup {
    /// Landscape, every column on one page width, rows flowing onto as many
    /// pages as needed, narrow margins.
    fn default() -> Self {
        Self {
            landscape: true,
            fit_to_pages_wide: 1,
            left_margin: 0.25,
            right_margin: 0.25,
            top_margin: 0.25,
            bottom_margin: 0.25,
            header_margin: 0.2,
            footer_margin: 0.2,
        }
    }
}

/// A response sent from the bridge back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Payload of a successful response, distinguished by its field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Handle to a newly opened workbook.
    WorkbookHandle { workbook: u64 },
    /// Worksheet names.
    SheetNames { sheets: Vec<String> },
}

impl From<Result<Option<ResponseData>, String>> for ResponseResult {
    fn from(result: Result<Option<ResponseData>, String>) -> Self {
        match result {
            Ok(data) => ResponseResult::Ok { data },
            Err(message) => ResponseResult::Error { message },
        }
    }
}

impl Response {
    pub fn ok(id: u64, data: Option<ResponseData>) -> Self {
        Self {
            id,
            result: ResponseResult::Ok { data },
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: ResponseResult::Error {
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_command_wire_format() {
        let req = Request {
            id: 1,
            command: Command::Init,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"id":1,"cmd":"Init"}"#);
    }

    #[test]
    fn test_export_command_wire_format() {
        let req = Request {
            id: 7,
            command: Command::ExportSheetPdf {
                workbook: 2,
                sheet: "画面一覧".into(),
                path: "Z:\\tmp\\out.pdf".into(),
                page_setup: PageSetup::default(),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["cmd"], "ExportSheetPdf");
        assert_eq!(json["params"]["sheet"], "画面一覧");
        assert_eq!(json["params"]["page_setup"]["fit_to_pages_wide"], 1);

        let back: Request = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_parse_responses() {
        let ok: Response = serde_json::from_str(r#"{"id":3,"status":"ok"}"#).unwrap();
        assert_eq!(ok, Response::ok(3, None));

        let handle: Response =
            serde_json::from_str(r#"{"id":4,"status":"ok","data":{"workbook":9}}"#).unwrap();
        assert_eq!(
            handle.result,
            ResponseResult::Ok {
                data: Some(ResponseData::WorkbookHandle { workbook: 9 })
            }
        );

        let sheets: Response = serde_json::from_str(
            r#"{"id":5,"status":"ok","data":{"sheets":["表紙","設計"]}}"#,
        )
        .unwrap();
        assert_eq!(
            sheets.result,
            ResponseResult::Ok {
                data: Some(ResponseData::SheetNames {
                    sheets: vec!["表紙".into(), "設計".into()]
                })
            }
        );

        let err: Response =
            serde_json::from_str(r#"{"id":6,"status":"error","message":"boom"}"#).unwrap();
        assert_eq!(err, Response::error(6, "boom"));
    }

    #[test]
    fn test_result_conversion() {
        let ok: ResponseResult = Ok(None).into();
        assert_eq!(ok, ResponseResult::Ok { data: None });

        let err: ResponseResult = Err::<Option<ResponseData>, _>("Excel is not running".to_string()).into();
        assert_eq!(
            err,
            ResponseResult::Error {
                message: "Excel is not running".into()
            }
        );
    }
}
