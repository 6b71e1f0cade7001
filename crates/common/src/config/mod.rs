//! Configuration management for DocIntake services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Upload storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text extraction (OCR) configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Summarization / NER service configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (postgres:// or sqlite:)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Log every SQL statement
    #[serde(default)]
    pub sqlx_logging: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Tesseract language spec (e.g. "eng+mal")
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,

    /// Rasterization resolution for OCR of PDF pages
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,

    /// Tesseract binary
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,

    /// Poppler pdftoppm binary
    #[serde(default = "default_pdftoppm_bin")]
    pub pdftoppm_bin: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Inference provider: huggingface, mock
    #[serde(default = "default_inference_provider")]
    pub provider: String,

    /// Base URL models are addressed under
    #[serde(default = "default_inference_api_base")]
    pub api_base: String,

    /// API token for the inference endpoint
    pub api_key: Option<String>,

    /// Summarization model
    #[serde(default = "default_summarization_model")]
    pub summarization_model: String,

    /// Named-entity-recognition model
    #[serde(default = "default_ner_model")]
    pub ner_model: String,

    /// Characters of document text handed to the summarizer
    #[serde(default = "default_summary_input_chars")]
    pub summary_input_chars: usize,

    /// Minimum summary length in tokens
    #[serde(default = "default_summary_min_length")]
    pub summary_min_length: u32,

    /// Maximum summary length in tokens
    #[serde(default = "default_summary_max_length")]
    pub summary_max_length: u32,

    /// Optional cap on characters handed to the NER model (unbounded when unset)
    pub ner_max_input_chars: Option<usize>,

    /// Request timeout in seconds
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_database_url() -> String { "postgres://localhost/docintake".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_ocr_languages() -> String { "eng+mal".to_string() }
fn default_ocr_dpi() -> u32 { 300 }
fn default_tesseract_bin() -> String { "tesseract".to_string() }
fn default_pdftoppm_bin() -> String { "pdftoppm".to_string() }
fn default_inference_provider() -> String { "huggingface".to_string() }
fn default_inference_api_base() -> String { "https://router.huggingface.co/hf-inference/models".to_string() }
fn default_summarization_model() -> String { crate::DEFAULT_SUMMARIZATION_MODEL.to_string() }
fn default_ner_model() -> String { crate::DEFAULT_NER_MODEL.to_string() }
fn default_summary_input_chars() -> usize { 1000 }
fn default_summary_min_length() -> u32 { 40 }
fn default_summary_max_length() -> u32 { 150 }
fn default_inference_timeout() -> u64 { 120 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            sqlx_logging: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_languages: default_ocr_languages(),
            ocr_dpi: default_ocr_dpi(),
            tesseract_bin: default_tesseract_bin(),
            pdftoppm_bin: default_pdftoppm_bin(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_inference_provider(),
            api_base: default_inference_api_base(),
            api_key: None,
            summarization_model: default_summarization_model(),
            ner_model: default_ner_model(),
            summary_input_chars: default_summary_input_chars(),
            summary_min_length: default_summary_min_length(),
            summary_max_length: default_summary_max_length(),
            ner_max_input_chars: None,
            timeout_secs: default_inference_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl InferenceConfig {
    /// Per-request timeout for model calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
