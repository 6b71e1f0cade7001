//! Optical character recognition via external tools.
//!
//! PDF pages are rasterized with `pdftoppm` and each image is passed to
//! `tesseract`. Both binaries come from the host (poppler-utils,
//! tesseract-ocr plus the configured language packs).

use crate::errors::IngestionError;
use docintake_common::config::ExtractionConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tracing::debug;

/// Tesseract-backed OCR engine
#[derive(Debug, Clone)]
pub struct OcrEngine {
    tesseract_bin: String,
    pdftoppm_bin: String,
    languages: String,
    dpi: u32,
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for OcrEngine {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            tesseract_bin: config.tesseract_bin.clone(),
            pdftoppm_bin: config.pdftoppm_bin.clone(),
            languages: config.ocr_languages.clone(),
            dpi: config.ocr_dpi,
        }
    }
}

impl OcrEngine {
    /// Run OCR on a single image file
    pub fn ocr_image(&self, image_path: &Path) -> Result<String, IngestionError> {
        let output = Command::new(&self.tesseract_bin)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages])
            .output();

        command_stdout(output, &self.tesseract_bin, image_path)
    }

    /// Rasterize every page of a PDF and OCR them in page order
    pub fn ocr_pdf(&self, pdf_path: &Path) -> Result<String, IngestionError> {
        let temp_dir = TempDir::new()?;
        let images = self.rasterize(pdf_path, temp_dir.path())?;

        debug!(pages = images.len(), dpi = self.dpi, "Running OCR on rasterized pages");

        let mut text = String::new();
        for image in &images {
            text.push_str(&self.ocr_image(image)?);
        }

        Ok(text)
    }

    /// Render all pages to PNG at the configured resolution
    fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, IngestionError> {
        let output = Command::new(&self.pdftoppm_bin)
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(pdf_path)
            .arg(out_dir.join("page"))
            .output();

        command_stdout(output, &self.pdftoppm_bin, pdf_path)?;

        // pdftoppm zero-pads page numbers to a common width, so lexical order is page order
        let mut images: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(IngestionError::OcrFailed {
                path: pdf_path.display().to_string(),
                message: "No page images generated".to_string(),
            });
        }

        Ok(images)
    }
}

/// Map a finished command to its stdout or an ingestion error
fn command_stdout(
    result: std::io::Result<Output>,
    tool: &str,
    input: &Path,
) -> Result<String, IngestionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => Err(IngestionError::OcrFailed {
            path: input.display().to_string(),
            message: format!(
                "{} exited with {}: {}",
                tool,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(IngestionError::ToolNotFound(tool.to_string()))
        }
        Err(e) => Err(IngestionError::IoError(e)),
    }
}
