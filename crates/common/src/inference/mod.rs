//! Pretrained model adapters
//!
//! Two narrow interfaces over hosted inference pipelines:
//! - [`Summarizer`]: abstractive summarization (seq2seq)
//! - [`EntityRecognizer`]: named-entity recognition with grouped spans
//!
//! Both are built once at startup by [`create_inference`] and shared
//! across requests behind an `Arc`.

mod huggingface;

pub use huggingface::{HuggingFaceEntityRecognizer, HuggingFaceSummarizer};

use crate::config::InferenceConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A grouped named-entity span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub entity_group: String,
    pub word: String,
    pub score: f64,
}

/// Trait for abstractive summarization
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a document. Implementations only read a bounded prefix.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Trait for named-entity recognition
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Extract grouped entity spans from text
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Process-wide model handles
#[derive(Clone)]
pub struct InferenceServices {
    pub summarizer: Arc<dyn Summarizer>,
    pub recognizer: Arc<dyn EntityRecognizer>,
}

/// Limits applied to text before it reaches a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub input_chars: usize,
    pub min_length: u32,
    pub max_length: u32,
}

impl From<&InferenceConfig> for SummaryBounds {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            input_chars: config.summary_input_chars,
            min_length: config.summary_min_length,
            max_length: config.summary_max_length,
        }
    }
}

/// Return at most `max_chars` characters of `text`, cut on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Deterministic summarizer for tests and offline runs.
///
/// Returns the first sentence of the truncated input.
pub struct MockSummarizer {
    bounds: SummaryBounds,
}

impl MockSummarizer {
    pub fn new(bounds: SummaryBounds) -> Self {
        Self { bounds }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let input = truncate_chars(text, self.bounds.input_chars);
        let sentence = match input.find(". ") {
            Some(end) => &input[..=end],
            None => input,
        };
        Ok(sentence.trim().to_string())
    }

    fn model_name(&self) -> &str {
        "mock-summarizer"
    }
}

/// Deterministic recognizer for tests and offline runs.
///
/// Tags every capitalized word as `MISC` with score 1.0.
pub struct MockEntityRecognizer;

#[async_trait]
impl EntityRecognizer for MockEntityRecognizer {
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>> {
        Ok(text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
            .map(|w| EntitySpan {
                entity_group: "MISC".to_string(),
                word: w.to_string(),
                score: 1.0,
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "mock-ner"
    }
}

/// Create the inference services based on configuration
pub fn create_inference(config: &InferenceConfig) -> Result<InferenceServices> {
    match config.provider.as_str() {
        "huggingface" => {
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?;

            Ok(InferenceServices {
                summarizer: Arc::new(HuggingFaceSummarizer::new(
                    client.clone(),
                    &config.api_base,
                    config.api_key.clone(),
                    &config.summarization_model,
                    SummaryBounds::from(config),
                )),
                recognizer: Arc::new(HuggingFaceEntityRecognizer::new(
                    client,
                    &config.api_base,
                    config.api_key.clone(),
                    &config.ner_model,
                    config.ner_max_input_chars,
                )),
            })
        }
        "mock" => Ok(InferenceServices {
            summarizer: Arc::new(MockSummarizer::new(SummaryBounds::from(config))),
            recognizer: Arc::new(MockEntityRecognizer),
        }),
        other => Err(AppError::Configuration {
            message: format!("Unknown inference provider: {}", other),
        }),
    }
}
