//! Hugging Face Inference API adapters
//!
//! Pipelines are addressed as `POST {api_base}/{model}` with a JSON body
//! `{"inputs": .., "parameters": {..}}`.

use super::{truncate_chars, EntityRecognizer, EntitySpan, Summarizer, SummaryBounds};
use crate::errors::{AppError, Result};
use crate::metrics::METRICS_PREFIX;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

/// Shared HTTP plumbing for one hosted model
struct ModelEndpoint {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl ModelEndpoint {
    fn new(client: reqwest::Client, api_base: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client,
            url: format!("{}/{}", api_base.trim_end_matches('/'), model),
            model: model.to_string(),
            api_key,
        }
    }

    fn inference_error(&self, message: String) -> AppError {
        metrics::counter!(
            format!("{}_inference_errors_total", METRICS_PREFIX),
            "model" => self.model.clone()
        )
        .increment(1);
        AppError::Inference {
            model: self.model.clone(),
            message,
        }
    }

    async fn invoke<T: DeserializeOwned>(&self, payload: serde_json::Value) -> Result<T> {
        let start = Instant::now();

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.inference_error(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.inference_error(format!("API error {}: {}", status, body)));
        }

        let result = response
            .json::<T>()
            .await
            .map_err(|e| self.inference_error(format!("Failed to parse response: {}", e)))?;

        metrics::histogram!(
            format!("{}_inference_duration_seconds", METRICS_PREFIX),
            "model" => self.model.clone()
        )
        .record(start.elapsed().as_secs_f64());

        Ok(result)
    }
}

/// Summarization pipeline (e.g. facebook/bart-large-cnn)
pub struct HuggingFaceSummarizer {
    endpoint: ModelEndpoint,
    bounds: SummaryBounds,
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        api_key: Option<String>,
        model: &str,
        bounds: SummaryBounds,
    ) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, api_base, api_key, model),
            bounds,
        }
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let input = truncate_chars(text, self.bounds.input_chars);

        let outputs: Vec<SummaryOutput> = self
            .endpoint
            .invoke(json!({
                "inputs": input,
                "parameters": {
                    "min_length": self.bounds.min_length,
                    "max_length": self.bounds.max_length,
                    "do_sample": false,
                }
            }))
            .await?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| self.endpoint.inference_error("Empty response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

/// Token-classification pipeline (e.g. dslim/bert-base-NER)
pub struct HuggingFaceEntityRecognizer {
    endpoint: ModelEndpoint,
    max_input_chars: Option<usize>,
}

#[derive(Deserialize)]
struct EntityOutput {
    entity_group: String,
    word: String,
    score: f64,
}

impl HuggingFaceEntityRecognizer {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        api_key: Option<String>,
        model: &str,
        max_input_chars: Option<usize>,
    ) -> Self {
        Self {
            endpoint: ModelEndpoint::new(client, api_base, api_key, model),
            max_input_chars,
        }
    }
}

#[async_trait]
impl EntityRecognizer for HuggingFaceEntityRecognizer {
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let input = match self.max_input_chars {
            Some(limit) => truncate_chars(text, limit),
            None => text,
        };

        let outputs: Vec<EntityOutput> = self
            .endpoint
            .invoke(json!({
                "inputs": input,
                "parameters": { "aggregation_strategy": "simple" }
            }))
            .await?;

        Ok(outputs
            .into_iter()
            .map(|o| EntitySpan {
                entity_group: o.entity_group,
                word: o.word,
                score: o.score,
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn bounds() -> SummaryBounds {
        SummaryBounds {
            input_chars: 10,
            min_length: 40,
            max_length: 150,
        }
    }

    #[tokio::test]
    async fn summarizer_sends_truncated_input_and_bounds() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/facebook/bart-large-cnn")
                    .header("authorization", "Bearer hf_test")
                    .json_body(json!({
                        "inputs": "Quarterly ",
                        "parameters": {"min_length": 40, "max_length": 150, "do_sample": false}
                    }));
                then.status(200)
                    .json_body(json!([{"summary_text": "Revenue grew."}]));
            })
            .await;

        let summarizer = HuggingFaceSummarizer::new(
            reqwest::Client::new(),
            &server.base_url(),
            Some("hf_test".to_string()),
            "facebook/bart-large-cnn",
            bounds(),
        );

        let summary = summarizer
            .summarize("Quarterly revenue grew by twelve percent.")
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Revenue grew.");
    }

    #[tokio::test]
    async fn summarizer_maps_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/facebook/bart-large-cnn");
                then.status(503).body("model loading");
            })
            .await;

        let summarizer = HuggingFaceSummarizer::new(
            reqwest::Client::new(),
            &server.base_url(),
            None,
            "facebook/bart-large-cnn",
            bounds(),
        );

        let err = summarizer.summarize("text").await.expect_err("error status");
        match err {
            AppError::Inference { model, message } => {
                assert_eq!(model, "facebook/bart-large-cnn");
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn recognizer_requests_grouped_entities_without_truncation() {
        let server = MockServer::start_async().await;
        let text = "Kochi Metro Rail Limited signed the agreement with Alstom.";
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/dslim/bert-base-NER").json_body(json!({
                    "inputs": text,
                    "parameters": {"aggregation_strategy": "simple"}
                }));
                then.status(200).json_body(json!([
                    {"entity_group": "ORG", "word": "Kochi Metro Rail Limited", "score": 0.9981, "start": 0, "end": 24},
                    {"entity_group": "ORG", "word": "Alstom", "score": 0.97, "start": 51, "end": 57}
                ]));
            })
            .await;

        let recognizer = HuggingFaceEntityRecognizer::new(
            reqwest::Client::new(),
            &server.base_url(),
            None,
            "dslim/bert-base-NER",
            None,
        );

        let entities = recognizer.extract_entities(text).await.expect("entities");

        mock.assert_async().await;
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_group, "ORG");
        assert_eq!(entities[0].word, "Kochi Metro Rail Limited");
        assert!((entities[1].score - 0.97).abs() < f64::EPSILON);
    }
}
