//! Export server example
//!
//! Runs the result-export REST API over a local SQLite database.
//!
//! ```bash
//! cargo run --example export_server -- [config.json]
//! ```
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:6790/swagger-ui
//! - List results via GET http://localhost:6790/results?taskId=1
//! - Download an export via GET http://localhost:6790/results/export?format=csv&taskId=1
//!
//! Set `RUST_LOG=result_export=debug` to see every export stage.

use std::path::PathBuf;
use std::sync::Arc;

use result_export::{Config, ResultExporter, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(&PathBuf::from(path))?,
        None => Config::default(),
    };

    tracing::info!(
        database = %config.persistence.database_path.display(),
        temp_dir = %config.export.temp_dir.display(),
        "starting export server"
    );

    let exporter = Arc::new(ResultExporter::new(config).await?);
    let server = exporter.spawn_api_server();

    run_with_shutdown(exporter).await?;
    server.await??;

    Ok(())
}
