//! Document intake and listing handlers

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use docintake_common::{
    db::models::Document,
    errors::{AppError, Result},
    inference::truncate_chars,
    EntitySpan,
};
use docintake_ingestion::Category;
use serde::Serialize;
use tracing::instrument;

use crate::AppState;

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// Characters of extracted text echoed back on upload
const PREVIEW_CHARS: usize = 500;

const SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub filename: String,
    pub category: Category,
    pub text_preview: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub status: &'static str,
    pub filename: String,
    pub summary: String,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub status: &'static str,
    pub filename: String,
    pub entities: Vec<EntitySpan>,
    pub category: Category,
}

/// An uploaded file pulled out of a multipart body
struct Upload {
    filename: String,
    bytes: Bytes,
}

/// Read the `file` field, skipping any other parts
async fn read_upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Upload> {
    let mut multipart = multipart.map_err(|e| AppError::Validation {
        message: e.body_text(),
        field: Some(FILE_FIELD.to_string()),
    })?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Upload { filename, bytes });
    }

    Err(AppError::MissingField {
        field: FILE_FIELD.to_string(),
    })
}

/// Upload a document, extract its text and assign a category
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let upload = read_upload(multipart).await?;
    let outcome = state.processor.ingest(&upload.filename, &upload.bytes).await?;

    Ok(Json(UploadResponse {
        status: SUCCESS,
        text_preview: truncate_chars(&outcome.document.text, PREVIEW_CHARS).to_string(),
        filename: outcome.document.filename,
        category: outcome.category,
    }))
}

/// Upload a document and summarize it
#[instrument(skip_all)]
pub async fn summarize(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>> {
    let upload = read_upload(multipart).await?;
    let (outcome, summary) = state
        .processor
        .summarize(&upload.filename, &upload.bytes)
        .await?;

    Ok(Json(SummaryResponse {
        status: SUCCESS,
        filename: outcome.document.filename,
        summary,
        category: outcome.category,
    }))
}

/// Upload a document and run named-entity recognition on it
#[instrument(skip_all)]
pub async fn extract_entities(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<EntitiesResponse>> {
    let upload = read_upload(multipart).await?;
    let (outcome, entities) = state
        .processor
        .extract_entities(&upload.filename, &upload.bytes)
        .await?;

    Ok(Json(EntitiesResponse {
        status: SUCCESS,
        filename: outcome.document.filename,
        entities,
        category: outcome.category,
    }))
}

/// List every stored document
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    let documents = state.processor.repository().list_documents().await?;
    Ok(Json(documents))
}

/// List documents whose category label matches exactly
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Document>>> {
    let documents = state
        .processor
        .repository()
        .list_documents_by_category(&category)
        .await?;
    Ok(Json(documents))
}
