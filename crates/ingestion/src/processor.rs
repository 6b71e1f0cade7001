//! Intake processor
//!
//! Core logic shared by the HTTP gateway and the `ingest` CLI: persist the
//! upload, extract text, categorize, optionally run a model, then upsert
//! the record keyed by filename.

use crate::categorizer::{categorize, Category};
use crate::errors::IngestionError;
use crate::extractor::{Extraction, ExtractionMethod, TextExtractor};
use docintake_common::config::AppConfig;
use docintake_common::db::models::Document;
use docintake_common::errors::Result;
use docintake_common::{metrics, DbPool, DocumentUpsert, EntitySpan, InferenceServices, Repository};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Which pipeline variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Summarize,
    ExtractEntities,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Summarize => "summarize",
            Operation::ExtractEntities => "extract_entities",
        }
    }
}

/// Result of running a document through the pipeline
#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    /// The stored record after the upsert
    pub document: Document,
    pub method: ExtractionMethod,
    pub category: Category,
}

/// One line of CLI output
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReport {
    pub filename: String,
    pub category: Category,
    pub method: ExtractionMethod,
    pub text_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntitySpan>>,
}

impl From<&IntakeOutcome> for IntakeReport {
    fn from(outcome: &IntakeOutcome) -> Self {
        Self {
            filename: outcome.document.filename.clone(),
            category: outcome.category,
            method: outcome.method,
            text_chars: outcome.document.text.chars().count(),
            summary: None,
            entities: None,
        }
    }
}

/// Document intake processor
pub struct DocumentProcessor {
    repository: Repository,
    extractor: TextExtractor,
    inference: InferenceServices,
    upload_dir: PathBuf,
}

impl DocumentProcessor {
    pub fn new(
        repository: Repository,
        extractor: TextExtractor,
        inference: InferenceServices,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            extractor,
            inference,
            upload_dir,
        }
    }

    /// Build a processor from application configuration
    pub fn from_config(config: &AppConfig, pool: DbPool, inference: InferenceServices) -> Self {
        Self::new(
            Repository::new(pool),
            TextExtractor::new((&config.extraction).into()),
            inference,
            config.storage.upload_dir.clone(),
        )
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Store, extract and categorize an upload
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IntakeOutcome> {
        let path = self.store_upload(filename, bytes).await?;
        let extraction = self.extract(path).await?;
        self.commit(filename, extraction, None, None, Operation::Upload)
            .await
    }

    /// Ingest an upload and attach a generated summary
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn summarize(&self, filename: &str, bytes: &[u8]) -> Result<(IntakeOutcome, String)> {
        let path = self.store_upload(filename, bytes).await?;
        let extraction = self.extract(path).await?;
        let summary = self.inference.summarizer.summarize(&extraction.text).await?;

        let outcome = self
            .commit(filename, extraction, Some(summary.clone()), None, Operation::Summarize)
            .await?;
        Ok((outcome, summary))
    }

    /// Ingest an upload and attach recognized entities
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn extract_entities(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(IntakeOutcome, Vec<EntitySpan>)> {
        let path = self.store_upload(filename, bytes).await?;
        let extraction = self.extract(path).await?;
        let entities = self
            .inference
            .recognizer
            .extract_entities(&extraction.text)
            .await?;

        let outcome = self
            .commit(
                filename,
                extraction,
                None,
                Some(join_entity_words(&entities)),
                Operation::ExtractEntities,
            )
            .await?;
        Ok((outcome, entities))
    }

    /// Run the pipeline on a file already on disk.
    ///
    /// The record is keyed by the file's name; the file is not copied.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_local(&self, path: &Path, operation: Operation) -> Result<IntakeReport> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IngestionError::InvalidFilename(path.display().to_string()))?;

        let extraction = self.extract(path.to_path_buf()).await?;

        match operation {
            Operation::Upload => {
                let outcome = self
                    .commit(&filename, extraction, None, None, operation)
                    .await?;
                Ok(IntakeReport::from(&outcome))
            }
            Operation::Summarize => {
                let summary = self.inference.summarizer.summarize(&extraction.text).await?;
                let outcome = self
                    .commit(&filename, extraction, Some(summary.clone()), None, operation)
                    .await?;
                Ok(IntakeReport {
                    summary: Some(summary),
                    ..IntakeReport::from(&outcome)
                })
            }
            Operation::ExtractEntities => {
                let entities = self
                    .inference
                    .recognizer
                    .extract_entities(&extraction.text)
                    .await?;
                let joined = join_entity_words(&entities);
                let outcome = self
                    .commit(&filename, extraction, None, Some(joined), operation)
                    .await?;
                Ok(IntakeReport {
                    entities: Some(entities),
                    ..IntakeReport::from(&outcome)
                })
            }
        }
    }

    /// Write upload bytes to `{upload_dir}/{name}`, replacing any previous file
    pub async fn store_upload(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = stored_name(filename)?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Upload stored");
        Ok(path)
    }

    /// Extract text off the async runtime
    async fn extract(&self, path: PathBuf) -> Result<Extraction> {
        let extractor = self.extractor.clone();

        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| IngestionError::TaskFailed(e.to_string()))??;

        Ok(extraction)
    }

    /// Categorize extracted text and upsert the record
    async fn commit(
        &self,
        filename: &str,
        extraction: Extraction,
        summary: Option<String>,
        entities: Option<String>,
        operation: Operation,
    ) -> Result<IntakeOutcome> {
        let category = categorize(&extraction.text);

        let document = self
            .repository
            .upsert_document(DocumentUpsert {
                filename: filename.to_string(),
                text: extraction.text,
                category: category.to_string(),
                summary,
                entities,
            })
            .await?;

        metrics::record_document(operation.as_str(), category.as_str());
        info!(
            filename = %document.filename,
            operation = operation.as_str(),
            category = %category,
            method = extraction.method.as_str(),
            "Document processed"
        );

        Ok(IntakeOutcome {
            document,
            method: extraction.method,
            category,
        })
    }
}

/// Final path component of a client-supplied filename
fn stored_name(filename: &str) -> std::result::Result<&str, IngestionError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(IngestionError::InvalidFilename(filename.to_string()));
    }
    Ok(name)
}

/// Stored form of an entity list: the words joined with ", "
pub fn join_entity_words(entities: &[EntitySpan]) -> String {
    entities
        .iter()
        .map(|e| e.word.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::write_text_pdf;
    use docintake_common::config::{DatabaseConfig, InferenceConfig};
    use docintake_common::errors::AppError;
    use docintake_common::inference::create_inference;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    async fn processor(upload_dir: &Path) -> DocumentProcessor {
        let pool = DbPool::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..DatabaseConfig::default()
        })
        .await
        .unwrap();
        pool.ensure_schema().await.unwrap();

        let inference = create_inference(&InferenceConfig {
            provider: "mock".to_string(),
            ..InferenceConfig::default()
        })
        .unwrap();

        DocumentProcessor::new(
            Repository::new(pool),
            TextExtractor::default(),
            inference,
            upload_dir.to_path_buf(),
        )
    }

    #[test]
    fn test_stored_name_drops_directories() {
        assert_eq!(assert_ok!(stored_name("report.pdf")), "report.pdf");
        assert_eq!(assert_ok!(stored_name("../../etc/passwd")), "passwd");
        assert_eq!(assert_ok!(stored_name("C:\\scans\\memo.txt")), "memo.txt");
        assert_err!(stored_name(""));
        assert_err!(stored_name("dir/"));
        assert_err!(stored_name(".."));
    }

    #[test]
    fn test_join_entity_words() {
        let spans = vec![
            EntitySpan {
                entity_group: "PER".to_string(),
                word: "Alice".to_string(),
                score: 0.99,
            },
            EntitySpan {
                entity_group: "LOC".to_string(),
                word: "Kochi".to_string(),
                score: 0.97,
            },
        ];
        assert_eq!(join_entity_words(&spans), "Alice, Kochi");
        assert_eq!(join_entity_words(&[]), "");
    }

    #[tokio::test]
    async fn test_ingest_pdf_upload() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.pdf");
        write_text_pdf(&source, &["This is an employee leave policy."]);
        let bytes = std::fs::read(&source).unwrap();

        let uploads = dir.path().join("uploads");
        let processor = processor(&uploads).await;
        let outcome = processor.ingest("policy.pdf", &bytes).await.unwrap();

        assert_eq!(outcome.category, Category::Hr);
        assert_eq!(outcome.method, ExtractionMethod::TextLayer);
        assert_eq!(outcome.document.text, "This is an employee leave policy.");
        assert_eq!(outcome.document.category.as_deref(), Some("HR"));
        assert!(uploads.join("policy.pdf").exists());
    }

    #[tokio::test]
    async fn test_summarize_twice_keeps_one_record() {
        let dir = TempDir::new().unwrap();
        let processor = processor(dir.path()).await;

        processor
            .summarize("memo.txt", b"Budget review. Numbers follow.")
            .await
            .unwrap();
        let (outcome, summary) = processor
            .summarize("memo.txt", b"Contract renewal. Terms follow.")
            .await
            .unwrap();

        assert_eq!(summary, "Contract renewal.");
        assert_eq!(outcome.category, Category::Legal);

        let repo = processor.repository();
        assert_eq!(repo.count_documents().await.unwrap(), 1);
        let stored = repo.find_document_by_filename("memo.txt").await.unwrap().unwrap();
        assert_eq!(stored.summary.as_deref(), Some("Contract renewal."));
    }

    #[tokio::test]
    async fn test_entities_stored_joined() {
        let dir = TempDir::new().unwrap();
        let processor = processor(dir.path()).await;

        let (outcome, entities) = processor
            .extract_entities("letter.txt", b"signed by Alice in Kochi")
            .await
            .unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(outcome.document.entities.as_deref(), Some("Alice, Kochi"));
        assert_eq!(outcome.category, Category::General);
    }

    #[tokio::test]
    async fn test_upload_keeps_existing_summary() {
        let dir = TempDir::new().unwrap();
        let processor = processor(dir.path()).await;

        processor.summarize("plan.txt", b"Payment schedule.").await.unwrap();
        let outcome = processor.ingest("plan.txt", b"Payment schedule.").await.unwrap();

        assert_eq!(outcome.document.summary.as_deref(), Some("Payment schedule."));
    }

    #[tokio::test]
    async fn test_empty_filename_rejected() {
        let dir = TempDir::new().unwrap();
        let processor = processor(dir.path()).await;

        let err = processor.ingest("", b"text").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFilename { .. }));
        assert_eq!(processor.repository().count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_commits_nothing() {
        let dir = TempDir::new().unwrap();
        let processor = processor(dir.path()).await;

        // Neither a PDF nor OCR-able without tools on PATH
        let broken = DocumentProcessor {
            extractor: TextExtractor::new(crate::ocr::OcrEngine::from(
                &docintake_common::config::ExtractionConfig {
                    pdftoppm_bin: "docintake-missing-pdftoppm".to_string(),
                    ..Default::default()
                },
            )),
            ..processor
        };

        let err = broken.ingest("scan.pdf", b"not a pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
        assert_eq!(broken.repository().count_documents().await.unwrap(), 0);
        assert!(dir.path().join("scan.pdf").exists());
    }

    #[tokio::test]
    async fn test_ingest_local_summarize_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "Design notes for the engineering team.").unwrap();

        let processor = processor(&dir.path().join("uploads")).await;
        let report = processor
            .ingest_local(&path, Operation::Summarize)
            .await
            .unwrap();

        assert_eq!(report.filename, "notes.md");
        assert_eq!(report.category, Category::Technical);
        assert_eq!(report.summary.as_deref(), Some("Design notes for the engineering team."));
        assert!(report.entities.is_none());

        let line = serde_json::to_value(&report).unwrap();
        assert_eq!(line["method"], "plain_text");
        assert!(line.get("entities").is_none());
    }
}
