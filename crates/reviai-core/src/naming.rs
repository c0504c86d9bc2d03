//! File naming conventions shared by the export, review and report steps.

use lazy_regex::regex;

const KANJI_NUMERALS: [&str; 10] = ["一", "二", "三", "四", "五", "六", "七", "八", "九", "十"];

/// PDF file name for an exported sheet: `{stem}_{sheet}_V{version}.pdf`.
pub fn pdf_file_name(workbook_stem: &str, sheet: &str, version: u32) -> String {
    format!(
        "{}_{}_V{}.pdf",
        workbook_stem,
        sanitize_component(sheet),
        version
    )
}

/// Review round as written in the result file name: kanji for 1-10.
pub fn round_name(round: u32) -> String {
    match round {
        1..=10 => KANJI_NUMERALS[(round - 1) as usize].to_string(),
        n => n.to_string(),
    }
}

/// Result workbook name: `第{round}回.xlsx`.
pub fn result_file_name(round: u32) -> String {
    format!("第{}回.xlsx", round_name(round))
}

/// Version marker (`V6`, `_v7`) embedded in a document file name.
pub fn document_version(file_name: &str) -> Option<u32> {
    // A marker stands alone unless an ASCII letter or digit touches it, so
    // `設計書V7` and `（V7）` count while `dev7` does not.
    let standalone = |c: Option<char>| !c.is_some_and(|c| c.is_ascii_alphanumeric());
    regex!(r"(?i)v(\d+)")
        .captures_iter(file_name)
        .filter_map(|c| {
            let (marker, digits) = (c.get(0)?, c.get(1)?);
            let before = file_name[..marker.start()].chars().next_back();
            let after = file_name[marker.end()..].chars().next();
            if standalone(before) && standalone(after) {
                digits.as_str().parse().ok()
            } else {
                None
            }
        })
        .last()
}

/// Sheet names may contain characters that are invalid in file names.
fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
