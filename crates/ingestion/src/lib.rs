//! DocIntake Ingestion Library
//!
//! Document intake pipeline:
//! - Text extraction (PDF text layer, OCR fallback, plain text)
//! - Keyword categorization
//! - Summarization and entity recognition through the shared adapters
//! - Upsert into the document store

pub mod categorizer;
pub mod errors;
pub mod extractor;
pub mod ocr;
pub mod pdf;
pub mod processor;

pub use categorizer::{categorize, Category};
pub use errors::IngestionError;
pub use extractor::{Extraction, ExtractionMethod, TextExtractor};
pub use ocr::OcrEngine;
pub use processor::{DocumentProcessor, IntakeOutcome, IntakeReport, Operation};
