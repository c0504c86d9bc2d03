//! Review inputs (PDF or Markdown) → one combined Markdown document.

use std::fs;
use std::path::{Path, PathBuf};

use reviai_core::naming::document_version;

use crate::error::{ReviewError, ReviewResult};

const RULE_WIDTH: usize = 80;

/// Kind of input document, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
}

impl DocumentKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "md" | "markdown" => Some(DocumentKind::Markdown),
            _ => None,
        }
    }
}

/// Convert every file to Markdown and join them into sections.
///
/// Each section is headed with the file name and a marker telling the model
/// whether the document is the current or a previous version.
pub fn convert_files_to_markdown(paths: &[PathBuf]) -> ReviewResult<String> {
    let markers = version_markers(paths);
    let mut sections = Vec::with_capacity(paths.len());

    for (path, marker) in paths.iter().zip(markers) {
        let content = document_text(path)?;
        let file_name = file_name(path);
        tracing::info!("Processed {}{}", file_name, marker);
        sections.push(section(&file_name, &marker, &content));
    }

    let combined = sections.join("\n\n");
    tracing::info!(
        "Combined {} files into Markdown ({} characters)",
        paths.len(),
        combined.chars().count()
    );
    Ok(combined)
}

/// Text content of a single PDF or Markdown file.
pub fn document_text(path: &Path) -> ReviewResult<String> {
    if !path.exists() {
        return Err(ReviewError::NotFound(path.to_path_buf()));
    }

    let text = match DocumentKind::of(path) {
        Some(DocumentKind::Markdown) => fs::read_to_string(path)?,
        Some(DocumentKind::Pdf) => {
            tracing::debug!("Extracting text from {}", path.display());
            extract_pdf_text(path)?
        }
        None => return Err(ReviewError::UnsupportedDocument(path.to_path_buf())),
    };

    if text.trim().is_empty() {
        return Err(ReviewError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: "no text content".into(),
        });
    }
    Ok(text)
}

/// pdf-extract panics on some malformed content streams; those count as
/// unreadable like any other extraction failure.
fn extract_pdf_text(path: &Path) -> ReviewResult<String> {
    let unreadable = |reason: String| ReviewError::UnreadableDocument {
        path: path.to_path_buf(),
        reason,
    };
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(result) => result.map_err(|e| unreadable(e.to_string())),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| payload.downcast_ref::<&str>().copied())
                .unwrap_or("PDF parser panicked");
            tracing::warn!("PDF text extraction panicked for {}: {}", path.display(), reason);
            Err(unreadable(format!("malformed PDF: {reason}")))
        }
    }
}

fn section(file_name: &str, marker: &str, content: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\nドキュメント: {file_name}{marker}\nファイル名: {file_name}\n{rule}\n\n{content}\n")
}

/// One marker per path: the newest version is the current design document,
/// older versions are previous ones, unversioned files are numbered.
fn version_markers(paths: &[PathBuf]) -> Vec<String> {
    let versions: Vec<Option<u32>> = paths
        .iter()
        .map(|p| document_version(&file_name(p)))
        .collect();
    let latest = versions.iter().flatten().max().copied();

    versions
        .iter()
        .enumerate()
        .map(|(idx, version)| match (version, latest) {
            (Some(v), Some(latest)) if *v == latest => format!(" (今回の設計書 V{v})"),
            (Some(v), _) => format!(" (前回の設計書 V{v})"),
            (None, _) => format!(" (Document {})", idx + 1),
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_single_markdown_section() {
        let dir = tempfile::tempdir().unwrap();
        let md = write(dir.path(), "notes.md", "# 画面一覧\n- 項目");

        let out = convert_files_to_markdown(&[md]).unwrap();
        let rule = "=".repeat(80);
        assert_eq!(
            out,
            format!(
                "\n{rule}\nドキュメント: notes.md (Document 1)\nファイル名: notes.md\n{rule}\n\n# 画面一覧\n- 項目\n"
            )
        );
    }

    /// One-page PDF whose content stream shows text without selecting a font.
    fn pdf_without_font() -> Vec<u8> {
        let content = "BT 10 10 Td (Hello) Tj ET";
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Contents 4 0 R >>".to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n", objects.len() + 1)
                .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_malformed_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("設計書_V7.pdf");
        fs::write(&path, pdf_without_font()).unwrap();

        match document_text(&path) {
            Err(ReviewError::UnreadableDocument { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected UnreadableDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_version_markers() {
        let paths: Vec<PathBuf> = ["設計書_画面_V6.pdf", "設計書_画面_V7.pdf", "補足.md"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(
            version_markers(&paths),
            vec![
                " (前回の設計書 V6)".to_string(),
                " (今回の設計書 V7)".to_string(),
                " (Document 3)".to_string(),
            ]
        );
    }

    #[test]
    fn test_single_version_is_current() {
        let paths = vec![PathBuf::from("book_Sheet_V3.md")];
        assert_eq!(version_markers(&paths), vec![" (今回の設計書 V3)".to_string()]);
    }

    #[test]
    fn test_sections_joined_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a_V1.md", "old");
        let b = write(dir.path(), "a_V2.md", "new");

        let out = convert_files_to_markdown(&[a, b]).unwrap();
        let old = out.find("old").unwrap();
        let new = out.find("new").unwrap();
        assert!(old < new);
        assert!(out.contains("ドキュメント: a_V1.md (前回の設計書 V1)"));
        assert!(out.contains("ドキュメント: a_V2.md (今回の設計書 V2)"));
        assert!(out.contains("old\n\n\n\n===="));
    }

    #[test]
    fn test_missing_file() {
        let err = convert_files_to_markdown(&[PathBuf::from("/nonexistent/a.pdf")]).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let docx = write(dir.path(), "仕様書.docx", "x");
        assert!(matches!(
            document_text(&docx),
            Err(ReviewError::UnsupportedDocument(_))
        ));
    }

    #[test]
    fn test_empty_markdown_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let md = write(dir.path(), "empty.md", "  \n");
        assert!(matches!(
            document_text(&md),
            Err(ReviewError::UnreadableDocument { .. })
        ));
    }

    #[test]
    fn test_broken_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write(dir.path(), "broken.pdf", "this is not a pdf");
        assert!(matches!(
            document_text(&pdf),
            Err(ReviewError::UnreadableDocument { .. })
        ));
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::of(Path::new("a.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::of(Path::new("a.markdown")), Some(DocumentKind::Markdown));
        assert_eq!(DocumentKind::of(Path::new("a.txt")), None);
    }
}
