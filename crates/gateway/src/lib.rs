//! DocIntake API Gateway
//!
//! HTTP surface over the intake pipeline:
//! - Multipart uploads for classification, summarization and NER
//! - Document listing, optionally by category
//! - Health, readiness and Prometheus metrics

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docintake_common::{config::AppConfig, db::DbPool};
use docintake_ingestion::DocumentProcessor;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub processor: Arc<DocumentProcessor>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Pipeline endpoints
        .route("/upload/", post(handlers::documents::upload))
        .route("/summarize/", post(handlers::documents::summarize))
        .route("/extract_entities/", post(handlers::documents::extract_entities))
        // Listing
        .route("/documents/", get(handlers::documents::list_documents))
        .route("/documents/{category}", get(handlers::documents::list_by_category))
        // Operational endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics));

    Router::new()
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}
