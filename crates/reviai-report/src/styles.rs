//! The fixed style sheet of the result workbook.

/// `cellXfs` index of header cells: bold on light blue, centered, thin borders.
pub(crate) const HEADER_XF: u32 = 1;

/// `cellXfs` index of data cells: top-left aligned, wrapped, thin borders.
pub(crate) const DATA_XF: u32 = 2;

/// Header background (RGB).
pub(crate) const HEADER_FILL: &str = "ADD8E6";

pub(crate) fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="2">
        <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
        <font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>
    </fonts>
    <fills count="3">
        <fill><patternFill patternType="none"/></fill>
        <fill><patternFill patternType="gray125"/></fill>
        <fill><patternFill patternType="solid"><fgColor rgb="FF{fill}"/><bgColor rgb="FF{fill}"/></patternFill></fill>
    </fills>
    <borders count="2">
        <border><left/><right/><top/><bottom/><diagonal/></border>
        <border>{thin}</border>
    </borders>
    <cellStyleXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    </cellStyleXfs>
    <cellXfs count="3">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
        <xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center"/></xf>
        <xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1" applyAlignment="1"><alignment horizontal="left" vertical="top" wrapText="1"/></xf>
    </cellXfs>
    <cellStyles count="1">
        <cellStyle name="Normal" xfId="0" builtinId="0"/>
    </cellStyles>
</styleSheet>"#,
        fill = HEADER_FILL,
        thin = thin_sides(),
    )
}

fn thin_sides() -> String {
    ["left", "right", "top", "bottom"]
        .iter()
        .map(|side| format!(r#"<{side} style="thin"><color auto="1"/></{side}>"#))
        .chain(std::iter::once("<diagonal/>".to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fill_and_borders() {
        let xml = styles_xml();
        assert!(xml.contains(r#"<fgColor rgb="FFADD8E6"/>"#));
        assert!(xml.contains(r#"<left style="thin"><color auto="1"/></left>"#));
        assert!(xml.contains(r#"<bottom style="thin"><color auto="1"/></bottom><diagonal/>"#));
    }
}
