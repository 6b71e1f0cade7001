//! DocIntake ingest CLI
//!
//! Runs the intake pipeline against local files and prints one JSON line
//! per file. Failures are logged and do not stop the batch.

use anyhow::Context;
use clap::Parser;
use docintake_common::{
    config::AppConfig, db::DbPool, inference::create_inference, telemetry, VERSION,
};
use docintake_ingestion::{DocumentProcessor, Operation};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "ingest", version, about = "Extract, categorize and store local documents")]
struct Cli {
    /// Files to ingest
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Generate a summary for each file
    #[arg(long, conflicts_with = "entities")]
    summarize: bool,

    /// Run named-entity recognition on each file
    #[arg(long)]
    entities: bool,
}

impl Cli {
    fn operation(&self) -> Operation {
        if self.summarize {
            Operation::Summarize
        } else if self.entities {
            Operation::ExtractEntities
        } else {
            Operation::Upload
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    telemetry::init_tracing(&config.observability);

    info!("Starting DocIntake ingest v{}", VERSION);

    let db = DbPool::new(&config.database).await?;
    db.ensure_schema().await?;

    let inference = create_inference(&config.inference)?;
    let processor = DocumentProcessor::from_config(&config, db, inference);

    let operation = cli.operation();
    let mut failed = 0usize;

    for path in &cli.files {
        match processor.ingest_local(path, operation).await {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            Err(e) => {
                failed += 1;
                error!(path = %path.display(), error = %e, "Failed to ingest file");
            }
        }
    }

    info!(
        total = cli.files.len(),
        failed,
        operation = operation.as_str(),
        "Ingest complete"
    );

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, cli.files.len());
    }
    Ok(())
}
