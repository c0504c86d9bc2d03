//! Result workbook writer

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use reviai_core::naming::result_file_name;
use reviai_core::{ReviewRow, ReviewTable};

use crate::error::{ReportError, ReportResult};
use crate::styles::{self, DATA_XF, HEADER_XF};

/// Name of the only worksheet.
pub const SHEET_NAME: &str = "評審結果";

const COLUMNS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
const MIN_WIDTH: usize = 10;
const MAX_WIDTH: usize = 50;

/// Write the review table to `{output_dir}/第{round}回.xlsx`.
pub fn save_review_workbook(
    table: &ReviewTable,
    round: u32,
    output_dir: &Path,
) -> ReportResult<PathBuf> {
    if table.is_empty() {
        return Err(ReportError::EmptyTable);
    }

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(result_file_name(round));

    tracing::info!("Creating Excel file: {}", path.display());
    tracing::info!("Processing {} rows", table.len());

    write_review_workbook(table, File::create(&path)?)?;

    tracing::info!("Excel file saved successfully: {}", path.display());
    Ok(path)
}

/// Write the review table as an XLSX workbook to any seekable writer.
pub fn write_review_workbook<W: Write + Seek>(table: &ReviewTable, writer: W) -> ReportResult<()> {
    if table.is_empty() {
        return Err(ReportError::EmptyTable);
    }

    let grid = Grid::new(table);
    let mut zip = zip::ZipWriter::new(writer);

    write_part(&mut zip, "[Content_Types].xml", CONTENT_TYPES)?;
    write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
    write_part(&mut zip, "xl/workbook.xml", &workbook_xml(grid.rows.len()))?;
    write_part(&mut zip, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS)?;
    write_part(&mut zip, "xl/styles.xml", &styles::styles_xml())?;
    write_part(&mut zip, "xl/worksheets/sheet1.xml", &grid.worksheet_xml())?;
    write_part(&mut zip, "xl/sharedStrings.xml", &grid.shared_strings_xml())?;

    zip.finish()?;
    Ok(())
}

fn write_part<W: Write + Seek>(
    zip: &mut zip::ZipWriter<W>,
    name: &str,
    content: &str,
) -> ReportResult<()> {
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

/// Header row plus data rows, with every cell as a shared string index.
struct Grid {
    rows: Vec<[Option<usize>; 8]>,
    strings: Vec<String>,
    widths: [usize; 8],
}

impl Grid {
    fn new(table: &ReviewTable) -> Self {
        let mut grid = Grid {
            rows: Vec::with_capacity(table.len() + 1),
            strings: Vec::new(),
            widths: [0; 8],
        };
        let mut index: HashMap<String, usize> = HashMap::new();

        grid.push_row(&ReviewRow::HEADERS, &mut index);
        for row in &table.rows {
            grid.push_row(&row.cells(), &mut index);
        }

        for width in grid.widths.iter_mut() {
            *width = (*width + 2).clamp(MIN_WIDTH, MAX_WIDTH);
        }
        grid
    }

    fn push_row(&mut self, cells: &[&str; 8], index: &mut HashMap<String, usize>) {
        let mut row = [None; 8];
        for (col, cell) in cells.iter().enumerate() {
            let text = normalize(cell);
            self.widths[col] = self.widths[col].max(longest_line(&text));
            if text.is_empty() {
                continue;
            }
            let id = match index.get(&text) {
                Some(&id) => id,
                None => {
                    let id = self.strings.len();
                    self.strings.push(text.clone());
                    index.insert(text, id);
                    id
                }
            };
            row[col] = Some(id);
        }
        self.rows.push(row);
    }

    fn worksheet_xml(&self) -> String {
        let last = range_ref(self.rows.len());
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <dimension ref="{last}"/>
    <cols>"#
        );

        for (i, width) in self.widths.iter().enumerate() {
            content.push_str(&format!(
                "\n        <col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                i + 1,
                i + 1,
                width
            ));
        }
        content.push_str("\n    </cols>\n    <sheetData>");

        for (r, row) in self.rows.iter().enumerate() {
            let style = if r == 0 { HEADER_XF } else { DATA_XF };
            content.push_str(&format!("\n        <row r=\"{}\">", r + 1));
            for (c, cell) in row.iter().enumerate() {
                let cell_ref = format!("{}{}", COLUMNS[c], r + 1);
                match cell {
                    Some(id) => content.push_str(&format!(
                        "<c r=\"{}\" s=\"{}\" t=\"s\"><v>{}</v></c>",
                        cell_ref, style, id
                    )),
                    // Empty cells still carry borders
                    None => content.push_str(&format!("<c r=\"{}\" s=\"{}\"/>", cell_ref, style)),
                }
            }
            content.push_str("</row>");
        }

        content.push_str(&format!(
            "\n    </sheetData>\n    <autoFilter ref=\"{last}\"/>\n</worksheet>"
        ));
        content
    }

    fn shared_strings_xml(&self) -> String {
        let total: usize = self.rows.iter().flatten().filter(|c| c.is_some()).count();
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            total,
            self.strings.len()
        );
        for s in &self.strings {
            content.push_str(&format!(
                "\n    <si><t xml:space=\"preserve\">{}</t></si>",
                escape_text(s)
            ));
        }
        content.push_str("\n</sst>");
        content
    }
}

/// `A1:H{rows}`
fn range_ref(rows: usize) -> String {
    format!("A1:{}{}", COLUMNS[COLUMNS.len() - 1], rows)
}

fn workbook_xml(rows: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="{name}" sheetId="1" r:id="rId1"/>
    </sheets>
    <definedNames>
        <definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">'{name}'!$A$1:$H${rows}</definedName>
    </definedNames>
</workbook>"#,
        name = escape_xml(SHEET_NAME),
        rows = rows
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Characters in the longest line of a cell.
fn longest_line(text: &str) -> usize {
    text.split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Cell text for `<t>`. Characters XML 1.0 forbids are written as OOXML
/// `_xHHHH_` escapes, and an underscore that would read as one is itself
/// escaped so the text round-trips.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {
                out.push_str(&format!("_x{:04X}_", c as u32))
            }
            '_' if looks_like_escape(&s[i..]) => out.push_str("_x005F_"),
            c => out.push(c),
        }
    }
    out
}

/// `_xHHHH_` at the start of `text`.
fn looks_like_escape(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() >= 7 && b[1] == b'x' && b[2..6].iter().all(u8::is_ascii_hexdigit) && b[6] == b'_'
}
