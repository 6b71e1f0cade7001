//! DocIntake Common Library
//!
//! Shared code for the DocIntake services including:
//! - Configuration management
//! - Error types and handling
//! - Document store (SeaORM entity, pool, repository)
//! - Summarization and entity-recognition adapters
//! - Metrics and tracing setup

pub mod config;
pub mod db;
pub mod errors;
pub mod inference;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, DocumentUpsert, Repository};
pub use errors::{AppError, Result};
pub use inference::{EntityRecognizer, EntitySpan, InferenceServices, Summarizer};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default summarization model
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";

/// Default named-entity-recognition model
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";
