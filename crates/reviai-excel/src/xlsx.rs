//! Worksheet names read straight from an OOXML workbook archive.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ExportError, ExportResult};

/// True for workbook formats that are ZIP + XML (`.xlsx`, `.xlsm`, ...).
pub fn is_ooxml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "xlsx" | "xlsm" | "xltx" | "xltm"
            )
        })
        .unwrap_or(false)
}

/// Worksheet names of an `.xlsx`/`.xlsm` file, in workbook order.
pub fn list_sheets_xlsx(path: &Path) -> ExportResult<Vec<String>> {
    if !path.exists() {
        return Err(ExportError::NotFound(path.to_path_buf()));
    }
    list_sheets_from_reader(File::open(path)?)
}

/// Worksheet names from any OOXML archive reader.
///
/// Chart sheets are skipped so the result matches Excel's `Worksheets`
/// collection.
pub fn list_sheets_from_reader<R: Read + Seek>(reader: R) -> ExportResult<Vec<String>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let sheets = read_workbook_xml(&mut archive)?;
    let kinds = read_workbook_rels(&mut archive)?;

    Ok(sheets
        .into_iter()
        .filter(|(_, r_id)| match kinds.get(r_id) {
            Some(kind) => kind.ends_with("/worksheet"),
            // Without relationship info, keep everything
            None => kinds.is_empty(),
        })
        .map(|(name, _)| name)
        .collect())
}

/// `(name, r:id)` for every `<sheet>` in `xl/workbook.xml`.
fn read_workbook_xml<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> ExportResult<Vec<(String, String)>> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| ExportError::MissingPart("xl/workbook.xml".into()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value().ok().map(|s| s.to_string()),
                        key if key.ends_with(b":id") => {
                            r_id = attr.unescape_value().ok().map(|s| s.to_string())
                        }
                        _ => {}
                    }
                }

                if let Some(name) = name {
                    sheets.push((name, r_id.unwrap_or_default()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExportError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Relationship id → relationship type from `xl/_rels/workbook.xml.rels`.
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> ExportResult<HashMap<String, String>> {
    let file = match archive.by_name("xl/_rels/workbook.xml.rels") {
        Ok(file) => file,
        Err(_) => return Ok(HashMap::new()),
    };

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                        b"Type" => rel_type = attr.unescape_value().ok().map(|s| s.to_string()),
                        _ => {}
                    }
                }

                if let (Some(id), Some(rel_type)) = (id, rel_type) {
                    rels.insert(id, rel_type);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExportError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const WORKSHEET_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    const CHARTSHEET_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";

    fn archive(workbook_xml: &str, rels_xml: Option<&str>) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(workbook_xml.as_bytes()).unwrap();
            if let Some(rels) = rels_xml {
                zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
                zip.write_all(rels.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_sheet_order_and_escapes() {
        let workbook = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="表紙" sheetId="3" r:id="rId1"/><sheet name="R&amp;D" sheetId="1" r:id="rId2"/><sheet name="画面一覧" sheetId="2" r:id="rId3"/></sheets></workbook>"#;
        let rels = format!(
            r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{WORKSHEET_REL}" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{WORKSHEET_REL}" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="{WORKSHEET_REL}" Target="worksheets/sheet3.xml"/></Relationships>"#
        );
        let bytes = archive(workbook, Some(&rels));

        let names = list_sheets_from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(names, vec!["表紙", "R&D", "画面一覧"]);
    }

    #[test]
    fn test_chart_sheets_are_skipped() {
        let workbook = r#"<workbook xmlns:r="r"><sheets><sheet name="Data" r:id="rId1"/><sheet name="Chart1" r:id="rId2"/></sheets></workbook>"#;
        let rels = format!(
            r#"<Relationships><Relationship Id="rId1" Type="{WORKSHEET_REL}" Target="a"/><Relationship Id="rId2" Type="{CHARTSHEET_REL}" Target="b"/></Relationships>"#
        );
        let bytes = archive(workbook, Some(&rels));

        assert_eq!(list_sheets_from_reader(Cursor::new(bytes)).unwrap(), vec!["Data"]);
    }

    #[test]
    fn test_without_rels_keeps_all_sheets() {
        let workbook = r#"<workbook><sheets><sheet name="A" sheetId="1"/><sheet name="B" sheetId="2"/></sheets></workbook>"#;
        let bytes = archive(workbook, None);
        assert_eq!(list_sheets_from_reader(Cursor::new(bytes)).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_missing_workbook_part() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = list_sheets_from_reader(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ExportError::MissingPart(_)));
    }

    #[test]
    fn test_not_a_zip() {
        let err = list_sheets_from_reader(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, ExportError::Zip(_)));
    }

    #[test]
    fn test_is_ooxml() {
        assert!(is_ooxml(Path::new("a.xlsx")));
        assert!(is_ooxml(Path::new("a.XLSM")));
        assert!(!is_ooxml(Path::new("a.xls")));
        assert!(!is_ooxml(Path::new("a")));
    }

    #[test]
    fn test_missing_file() {
        let err = list_sheets_xlsx(Path::new("/nonexistent/book.xlsx")).unwrap_err();
        assert!(matches!(err, ExportError::NotFound(_)));
    }
}
