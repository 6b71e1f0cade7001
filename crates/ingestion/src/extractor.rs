//! Text extraction with ordered fallback strategies
//!
//! Each file kind maps to a chain of strategies. The chain stops at the
//! first strategy producing non-blank text. A failing strategy is skipped
//! while others remain; the failure of the last one is returned.

use crate::errors::IngestionError;
use crate::ocr::OcrEngine;
use crate::pdf::extract_text_layer;
use docintake_common::metrics;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How the returned text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Selectable text embedded in a PDF
    TextLayer,
    /// Tesseract on rasterized pages or an image
    Ocr,
    /// File read as text
    PlainText,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::TextLayer => "text_layer",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::PlainText => "plain_text",
        }
    }
}

/// Result of text extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Trimmed text, possibly empty
    pub text: String,
    /// Strategy that produced `text` (the last one tried when all were blank)
    pub method: ExtractionMethod,
}

/// One way of getting text out of a file
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    fn extract(&self, path: &Path) -> Result<String, IngestionError>;
}

/// PDF text layer via lopdf
pub struct TextLayerStrategy;

impl ExtractionStrategy for TextLayerStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextLayer
    }

    fn extract(&self, path: &Path) -> Result<String, IngestionError> {
        extract_text_layer(path).map(|pdf| pdf.text)
    }
}

/// Rasterize PDF pages, then OCR
pub struct PdfOcrStrategy(pub OcrEngine);

impl ExtractionStrategy for PdfOcrStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ocr
    }

    fn extract(&self, path: &Path) -> Result<String, IngestionError> {
        info!(path = %path.display(), "No digital text found, running OCR");
        self.0.ocr_pdf(path)
    }
}

/// OCR an image file directly
pub struct ImageOcrStrategy(pub OcrEngine);

impl ExtractionStrategy for ImageOcrStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ocr
    }

    fn extract(&self, path: &Path) -> Result<String, IngestionError> {
        self.0.ocr_image(path)
    }
}

/// Read the file as (lossy) UTF-8
pub struct PlainTextStrategy;

impl ExtractionStrategy for PlainTextStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::PlainText
    }

    fn extract(&self, path: &Path) -> Result<String, IngestionError> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// File kinds with distinct extraction chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    PlainText,
}

impl DocumentKind {
    /// Classify by extension; anything unrecognized is handled as a PDF
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" => DocumentKind::Image,
            "txt" | "md" | "csv" => DocumentKind::PlainText,
            _ => DocumentKind::Pdf,
        }
    }
}

/// Run strategies in order until one yields non-blank text
pub fn run_chain(
    strategies: &[&dyn ExtractionStrategy],
    path: &Path,
) -> Result<Extraction, IngestionError> {
    let mut last = None;

    for (i, strategy) in strategies.iter().enumerate() {
        let method = strategy.method();
        let started = Instant::now();
        let is_last = i + 1 == strategies.len();

        match strategy.extract(path) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    metrics::record_extraction(method.as_str(), started);
                    debug!(method = method.as_str(), chars = text.len(), "Extraction succeeded");
                    return Ok(Extraction {
                        text: text.to_string(),
                        method,
                    });
                }
                debug!(method = method.as_str(), "Extraction produced no text");
                last = Some(method);
            }
            Err(e) if !is_last => {
                metrics::record_extraction_fallback(method.as_str());
                warn!(method = method.as_str(), error = %e, "Extraction strategy failed, trying next");
                last = Some(method);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Extraction {
        text: String::new(),
        method: last.unwrap_or(ExtractionMethod::PlainText),
    })
}

/// Text extractor that picks a strategy chain per file kind
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    ocr: OcrEngine,
}

impl TextExtractor {
    pub fn new(ocr: OcrEngine) -> Self {
        Self { ocr }
    }

    /// Extract text from a file, falling back to OCR for PDFs without a text layer
    pub fn extract(&self, path: &Path) -> Result<Extraction, IngestionError> {
        match DocumentKind::from_path(path) {
            DocumentKind::Pdf => {
                let ocr = PdfOcrStrategy(self.ocr.clone());
                run_chain(&[&TextLayerStrategy, &ocr], path)
            }
            DocumentKind::Image => {
                let ocr = ImageOcrStrategy(self.ocr.clone());
                run_chain(&[&ocr], path)
            }
            DocumentKind::PlainText => run_chain(&[&PlainTextStrategy], path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::write_text_pdf;
    use docintake_common::config::ExtractionConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy returning a canned outcome and counting calls
    struct Canned {
        method: ExtractionMethod,
        outcome: fn() -> Result<String, IngestionError>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn new(method: ExtractionMethod, outcome: fn() -> Result<String, IngestionError>) -> Self {
            Self {
                method,
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ExtractionStrategy for Canned {
        fn method(&self) -> ExtractionMethod {
            self.method
        }

        fn extract(&self, _path: &Path) -> Result<String, IngestionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn broken() -> Result<String, IngestionError> {
        Err(IngestionError::PdfParseError {
            path: "x.pdf".into(),
            message: "bad xref".into(),
        })
    }

    fn ocr_missing() -> Result<String, IngestionError> {
        Err(IngestionError::ToolNotFound("tesseract".into()))
    }

    fn blank() -> Result<String, IngestionError> {
        Ok("  \n ".into())
    }

    fn ocr_text() -> Result<String, IngestionError> {
        Ok("  scanned invoice \n".into())
    }

    fn digital() -> Result<String, IngestionError> {
        Ok("digital text".into())
    }

    #[test]
    fn test_first_non_blank_wins() {
        let primary = Canned::new(ExtractionMethod::TextLayer, digital);
        let fallback = Canned::new(ExtractionMethod::Ocr, ocr_text);

        let result = run_chain(&[&primary, &fallback], Path::new("a.pdf")).unwrap();

        assert_eq!(result.text, "digital text");
        assert_eq!(result.method, ExtractionMethod::TextLayer);
        assert_eq!(fallback.calls(), 0);
    }

    #[test]
    fn test_blank_text_layer_falls_back() {
        let primary = Canned::new(ExtractionMethod::TextLayer, blank);
        let fallback = Canned::new(ExtractionMethod::Ocr, ocr_text);

        let result = run_chain(&[&primary, &fallback], Path::new("a.pdf")).unwrap();

        assert_eq!(result.text, "scanned invoice");
        assert_eq!(result.method, ExtractionMethod::Ocr);
        assert_eq!(fallback.calls(), 1);
    }

    #[test]
    fn test_text_layer_failure_is_swallowed() {
        let primary = Canned::new(ExtractionMethod::TextLayer, broken);
        let fallback = Canned::new(ExtractionMethod::Ocr, ocr_text);

        let result = run_chain(&[&primary, &fallback], Path::new("a.pdf")).unwrap();
        assert_eq!(result.text, "scanned invoice");
    }

    #[test]
    fn test_last_strategy_failure_propagates() {
        let primary = Canned::new(ExtractionMethod::TextLayer, blank);
        let fallback = Canned::new(ExtractionMethod::Ocr, ocr_missing);

        let err = run_chain(&[&primary, &fallback], Path::new("a.pdf")).unwrap_err();
        assert!(matches!(err, IngestionError::ToolNotFound(_)));
    }

    #[test]
    fn test_all_blank_is_empty_not_error() {
        let primary = Canned::new(ExtractionMethod::TextLayer, blank);
        let fallback = Canned::new(ExtractionMethod::Ocr, blank);

        let result = run_chain(&[&primary, &fallback], Path::new("a.pdf")).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.method, ExtractionMethod::Ocr);
    }

    #[test]
    fn test_document_kind_by_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("scan.JPG")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_path(Path::new("no_extension")), DocumentKind::Pdf);
    }

    #[test]
    fn test_digital_pdf_uses_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.pdf");
        write_text_pdf(&path, &["This is an employee leave policy."]);

        let extraction = TextExtractor::default().extract(&path).unwrap();

        assert_eq!(extraction.text, "This is an employee leave policy.");
        assert_eq!(extraction.method, ExtractionMethod::TextLayer);
    }

    #[test]
    fn test_image_only_pdf_reaches_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_text_pdf(&path, &[]);

        let extractor = TextExtractor::new(OcrEngine::from(&ExtractionConfig {
            pdftoppm_bin: "docintake-missing-pdftoppm".to_string(),
            ..ExtractionConfig::default()
        }));

        // The empty text layer hands over to OCR, whose failure is fatal
        let err = extractor.extract(&path).unwrap_err();
        assert!(matches!(err, IngestionError::ToolNotFound(tool) if tool == "docintake-missing-pdftoppm"));
    }

    #[test]
    fn test_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "  Budget memo\n").unwrap();

        let extraction = TextExtractor::default().extract(&path).unwrap();
        assert_eq!(extraction.text, "Budget memo");
        assert_eq!(extraction.method, ExtractionMethod::PlainText);
    }
}
