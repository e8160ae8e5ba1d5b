//! # result-export
//!
//! Export service for stored crawl results. Given a task, it drains every
//! result record in cursor order, re-encodes the records as SQL `insert`
//! statements, CSV or JSON lines, writes them to a temporary file, packs the
//! file into a tar.gz archive and streams the archive back as a download.
//!
//! ## Quick Start
//!
//! ```no_run
//! use result_export::{Config, ResultExporter, run_with_shutdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exporter = Arc::new(ResultExporter::new(Config::default()).await?);
//!
//!     let server = exporter.spawn_api_server();
//!     run_with_shutdown(exporter).await?;
//!     server.await??;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Export pipeline
pub mod export;
/// Service handle
pub mod exporter;
/// Core types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExportConfig, PersistenceConfig};
pub use db::{Database, NewProject};
pub use error::{
    ApiError, DatabaseError, Error, ExportError, Result, ToHttpStatus, ValidationError,
};
pub use export::{ExportArtifact, ExportOrchestrator, ExportRequest, ResultSource};
pub use exporter::ResultExporter;
pub use types::{ExportFormat, ExportStage, Project, ResultPage, ResultRecord, Task, TaskId};

/// Wait for a termination signal, then shut the exporter down.
///
/// Cancels the server-wide token, which stops the API server and aborts
/// exports that are still running.
///
/// - **Unix:** SIGTERM or SIGINT, falling back to Ctrl+C if registration fails.
/// - **Other platforms:** Ctrl+C.
pub async fn run_with_shutdown(exporter: Arc<ResultExporter>) -> Result<()> {
    wait_for_signal().await;
    exporter.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
