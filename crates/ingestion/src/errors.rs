//! Ingestion error types

use docintake_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("OCR failed for {path}: {message}")]
    OcrFailed { path: String, message: String },

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IngestionError {
    /// Path the error refers to, when there is one
    fn path(&self) -> Option<&str> {
        match self {
            IngestionError::PdfParseError { path, .. } | IngestionError::OcrFailed { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::InvalidFilename(filename) => AppError::InvalidFilename { filename },
            IngestionError::IoError(err) => AppError::Internal {
                message: err.to_string(),
            },
            IngestionError::TaskFailed(message) => AppError::Internal { message },
            other => AppError::Extraction {
                path: other.path().unwrap_or("-").to_string(),
                message: other.to_string(),
            },
        }
    }
}
