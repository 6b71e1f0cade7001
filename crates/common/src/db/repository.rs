//! Repository pattern for database operations
//!
//! Provides a clean interface for all document data access.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

/// Field values for a document write, keyed by filename.
///
/// `text` and `category` are always written. `summary` and `entities`
/// only overwrite the stored value when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpsert {
    pub filename: String,
    pub text: String,
    pub category: String,
    pub summary: Option<String>,
    pub entities: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// Insert a document or update the existing row with the same filename.
    ///
    /// The write is a single `INSERT .. ON CONFLICT (filename) DO UPDATE`
    /// statement, so concurrent first-time writes for one filename converge
    /// on a single row.
    pub async fn upsert_document(&self, input: DocumentUpsert) -> Result<Document> {
        let now = chrono::Utc::now();

        let mut update_columns = vec![
            DocumentColumn::Text,
            DocumentColumn::Category,
            DocumentColumn::UpdatedAt,
        ];
        if input.summary.is_some() {
            update_columns.push(DocumentColumn::Summary);
        }
        if input.entities.is_some() {
            update_columns.push(DocumentColumn::Entities);
        }

        let document = DocumentActiveModel {
            id: NotSet,
            filename: Set(input.filename.clone()),
            text: Set(input.text),
            summary: Set(input.summary),
            entities: Set(input.entities),
            category: Set(Some(input.category)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        DocumentEntity::insert(document)
            .on_conflict(
                OnConflict::column(DocumentColumn::Filename)
                    .update_columns(update_columns)
                    .to_owned(),
            )
            .exec(self.conn())
            .await?;

        debug!(filename = %input.filename, "Document upserted");

        self.find_document_by_filename(&input.filename)
            .await?
            .ok_or(AppError::DocumentNotFound {
                filename: input.filename,
            })
    }

    /// Find a document by its filename
    pub async fn find_document_by_filename(&self, filename: &str) -> Result<Option<Document>> {
        DocumentEntity::find()
            .filter(DocumentColumn::Filename.eq(filename))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List every stored document
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        DocumentEntity::find()
            .order_by_asc(DocumentColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List documents with an exact category match
    pub async fn list_documents_by_category(&self, category: &str) -> Result<Vec<Document>> {
        DocumentEntity::find()
            .filter(DocumentColumn::Category.eq(category))
            .order_by_asc(DocumentColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Count stored documents
    pub async fn count_documents(&self) -> Result<u64> {
        DocumentEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }
}
