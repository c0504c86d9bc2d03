//! Read back the written workbook and check its parts.

use std::io::Read;

use pretty_assertions::assert_eq;
use quick_xml::events::Event;
use quick_xml::Reader;
use reviai_core::{ReviewRow, ReviewTable};
use reviai_report::{save_review_workbook, ReportError};

fn table() -> ReviewTable {
    ReviewTable::new(vec![
        ReviewRow {
            requirement_no: "REQ-001".into(),
            requirement_content: "ログインできること".into(),
            evaluation: "〇".into(),
            compliance_location: "画面一覧".into(),
            compliance_reason: "記載あり".into(),
            correction_plan: String::new(),
            response_status: String::new(),
            response_method: String::new(),
        },
        ReviewRow {
            requirement_no: "REQ-002".into(),
            requirement_content: "A & B <必須>".into(),
            evaluation: "×".into(),
            compliance_location: "帳票".into(),
            compliance_reason: "未記載\r\n遷移なし".into(),
            correction_plan: "追記する".into(),
            response_status: "有".into(),
            response_method: "V8で対応".into(),
        },
    ])
}

fn read_part(path: &std::path::Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

/// Text of every `<si>` in order.
fn shared_strings(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => strings.push(t.unescape().unwrap().into_owned()),
            Event::Eof => break,
            _ => {}
        }
    }
    strings
}

#[test]
fn test_saved_workbook_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_review_workbook(&table(), 6, &dir.path().join("results")).unwrap();
    assert_eq!(path, dir.path().join("results").join("第六回.xlsx"));

    let workbook = read_part(&path, "xl/workbook.xml");
    assert!(workbook.contains(r#"<sheet name="評審結果" sheetId="1" r:id="rId1"/>"#));

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<autoFilter ref="A1:H3"/>"#));
    assert!(sheet.contains(r#"<c r="A1" s="1" t="s"><v>0</v></c>"#));
    assert!(sheet.contains(r#"<c r="F2" s="2"/>"#));
    assert!(!sheet.contains("ht="));

    let strings = shared_strings(&read_part(&path, "xl/sharedStrings.xml"));
    assert_eq!(&strings[..8], &ReviewRow::HEADERS.map(String::from)[..]);
    assert!(strings.contains(&"A & B <必須>".to_string()));
    assert!(strings.contains(&"未記載\n遷移なし".to_string()));

    let styles = read_part(&path, "xl/styles.xml");
    assert!(styles.contains("FFADD8E6"));
    assert!(styles.contains(r#"wrapText="1""#));
}

#[test]
fn test_small_round_numbers_are_kanji() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_review_workbook(&table(), 10, dir.path()).unwrap();
    assert!(path.ends_with("第十回.xlsx"));

    let path = save_review_workbook(&table(), 12, dir.path()).unwrap();
    assert!(path.ends_with("第12回.xlsx"));
}

#[test]
fn test_empty_table_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results");
    let err = save_review_workbook(&ReviewTable::default(), 1, &out).unwrap_err();
    assert!(matches!(err, ReportError::EmptyTable));
    assert!(!out.exists());
}

#[test]
fn test_control_characters_are_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = table();
    table.rows[0].compliance_reason = "page1\u{000C}page2 \u{0001}".into();
    let path = save_review_workbook(&table, 2, dir.path()).unwrap();

    let xml = read_part(&path, "xl/sharedStrings.xml");
    assert!(!xml.chars().any(|c| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')));
    assert!(xml.contains("page1_x000C_page2 _x0001_"));
    assert!(shared_strings(&xml).contains(&"page1_x000C_page2 _x0001_".to_string()));
}
