//! Metrics and observability utilities
//!
//! Prometheus-style metric names under a common prefix, with
//! descriptions registered once at startup.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DocIntake metrics
pub const METRICS_PREFIX: &str = "docintake";

/// Buckets for extraction and inference latency (in seconds)
pub const PROCESSING_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.250,  // 250ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 1m
    120.0,  // 2m
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_documents_processed_total", METRICS_PREFIX),
        Unit::Count,
        "Documents processed, by operation"
    );

    describe_counter!(
        format!("{}_documents_categorized_total", METRICS_PREFIX),
        Unit::Count,
        "Category assignments, by label"
    );

    describe_counter!(
        format!("{}_extractions_total", METRICS_PREFIX),
        Unit::Count,
        "Successful text extractions, by method"
    );

    describe_counter!(
        format!("{}_extraction_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Extraction strategies that failed and were skipped"
    );

    describe_histogram!(
        format!("{}_extraction_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Text extraction latency in seconds"
    );

    describe_counter!(
        format!("{}_inference_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Failed model inference calls, by model"
    );

    describe_histogram!(
        format!("{}_inference_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Model inference latency in seconds"
    );
}

/// Record a processed document
pub fn record_document(operation: &'static str, category: &str) {
    counter!(format!("{}_documents_processed_total", METRICS_PREFIX), "operation" => operation)
        .increment(1);
    counter!(
        format!("{}_documents_categorized_total", METRICS_PREFIX),
        "category" => category.to_string()
    )
    .increment(1);
}

/// Record a completed extraction
pub fn record_extraction(method: &'static str, started: Instant) {
    counter!(format!("{}_extractions_total", METRICS_PREFIX), "method" => method).increment(1);
    histogram!(format!("{}_extraction_duration_seconds", METRICS_PREFIX), "method" => method)
        .record(started.elapsed().as_secs_f64());
}

/// Record a skipped extraction strategy
pub fn record_extraction_fallback(strategy: &'static str) {
    counter!(format!("{}_extraction_fallbacks_total", METRICS_PREFIX), "strategy" => strategy)
        .increment(1);
}
