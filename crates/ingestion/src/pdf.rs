//! PDF text-layer extraction
//!
//! Reads the selectable text embedded in a PDF using lopdf, page by page.
//! Glyph codes are mapped through each font's `/ToUnicode` CMap or
//! `/Encoding`, so CID fonts and WinAnsi text come out as Unicode.

use crate::errors::IngestionError;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Text recovered from a PDF's text layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub page_count: usize,
}

/// Extract the text layer of a PDF file.
///
/// Pages that fail to decode are skipped. The result may be empty for
/// scanned documents.
pub fn extract_text_layer(path: &Path) -> Result<PdfText, IngestionError> {
    let doc = Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    let mut text = String::new();

    debug!(page_count = pages.len(), "Extracting text layer from PDF");

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => {
                debug!(page = page_num, "Page has no text layer");
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let cleaned = clean_text(&text);

    debug!(
        original_len = text.len(),
        cleaned_len = cleaned.len(),
        "Text layer extraction complete"
    );

    Ok(PdfText {
        text: cleaned,
        page_count: pages.len(),
    })
}

/// Clean extracted text: blank out control characters, trim lines,
/// collapse runs of spaces, drop blank lines
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.chars()
                .map(|c| if c.is_control() || c == '\u{FEFF}' { ' ' } else { c })
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}


#[cfg(test)]
mod tests {
    use super::fixtures::{write_pdf, write_text_pdf};
    use super::*;
    use lopdf::{dictionary, Object, Stream, StringFormat};

    /// ToUnicode CMap mapping glyphs 0x2B, 0x48, 0x55 to "H", "e", "r"
    const IDENTITY_CMAP: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<002B> <0048>
<0048> <0065>
<0055> <0072>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

    #[test]
    fn test_clean_text() {
        let input = "Hello\t  World\n\n  Test \u{92}";
        let cleaned = clean_text(input);
        assert_eq!(cleaned, "Hello World\nTest");
    }

    #[test]
    fn test_extracts_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.pdf");
        write_text_pdf(&path, &["This is an employee leave policy."]);

        let extracted = extract_text_layer(&path).unwrap();
        assert_eq!(extracted.text, "This is an employee leave policy.");
        assert_eq!(extracted.page_count, 1);
    }

    #[test]
    fn test_text_blocks_become_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        write_text_pdf(&path, &["Service Agreement", "Between the parties"]);

        let extracted = extract_text_layer(&path).unwrap();
        assert_eq!(extracted.text, "Service Agreement\nBetween the parties");
    }

    #[test]
    fn test_winansi_font_decodes_smart_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handbook.pdf");
        write_pdf(
            &path,
            |_| {
                dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                }
            },
            vec![Object::String(
                b"employee\x92s leave".to_vec(),
                StringFormat::Literal,
            )],
        );

        let extracted = extract_text_layer(&path).unwrap();
        assert_eq!(extracted.text, "employee\u{2019}s leave");
    }

    #[test]
    fn test_identity_h_font_uses_to_unicode_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.pdf");
        write_pdf(
            &path,
            |doc| {
                let to_unicode = doc.add_object(Stream::new(
                    dictionary! {},
                    IDENTITY_CMAP.as_bytes().to_vec(),
                ));
                let descendant = doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "CIDFontType2",
                    "BaseFont" => "Arial",
                    "CIDSystemInfo" => dictionary! {
                        "Registry" => Object::string_literal("Adobe"),
                        "Ordering" => Object::string_literal("Identity"),
                        "Supplement" => 0,
                    },
                });
                dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type0",
                    "BaseFont" => "Arial",
                    "Encoding" => "Identity-H",
                    "DescendantFonts" => vec![descendant.into()],
                    "ToUnicode" => to_unicode,
                }
            },
            vec![Object::String(
                vec![0x00, 0x2B, 0x00, 0x48, 0x00, 0x55],
                StringFormat::Hexadecimal,
            )],
        );

        let extracted = extract_text_layer(&path).unwrap();
        assert_eq!(extracted.text, "Her");
        assert!(!extracted.text.contains('\0'));
    }

    #[test]
    fn test_image_only_page_yields_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_text_pdf(&path, &[]);

        let extracted = extract_text_layer(&path).unwrap();
        assert!(extracted.text.is_empty());
    }

    #[test]
    fn test_non_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"plain bytes, not a pdf").unwrap();

        let err = extract_text_layer(&path).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
