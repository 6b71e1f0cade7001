//! DocIntake API Gateway
//!
//! Serves the intake pipeline over HTTP.

use anyhow::Context;
use docintake_common::{
    config::AppConfig,
    db::DbPool,
    inference::create_inference,
    metrics::{self, PROCESSING_BUCKETS},
    telemetry,
};
use docintake_gateway::{create_router, AppState};
use docintake_ingestion::DocumentProcessor;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    telemetry::init_tracing(&config.observability);

    info!("Starting DocIntake API Gateway v{}", docintake_common::VERSION);

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    db.ensure_schema().await?;

    // Models are built once and shared by every request
    let inference = create_inference(&config.inference)?;
    info!(
        summarizer = inference.summarizer.model_name(),
        recognizer = inference.recognizer.model_name(),
        "Inference services ready"
    );

    let processor = DocumentProcessor::from_config(&config, db.clone(), inference);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        processor: Arc::new(processor),
        metrics: metrics_handle,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout()))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the Prometheus recorder and describe our metrics
fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets(PROCESSING_BUCKETS)?
        .install_recorder()?;

    metrics::register_metrics();
    Ok(handle)
}

/// Graceful shutdown signal handler.
///
/// In-flight requests get `grace` to finish before the process exits.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
