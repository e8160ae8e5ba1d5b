//! Top-level service handle
//!
//! [`ResultExporter`] ties the result store, the export pipeline and the
//! server lifecycle together. It is what the HTTP layer and embedding
//! applications talk to.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result, ValidationError};
use crate::export::{ExportArtifact, ExportOrchestrator, ExportRequest, ResultSource};
use crate::types::{ResultPage, TaskId};

/// Largest page accepted by [`ResultExporter::browse`]
pub const MAX_BROWSE_PAGE_SIZE: u32 = 1000;

/// Result export service
pub struct ResultExporter {
    source: Arc<dyn ResultSource>,
    orchestrator: ExportOrchestrator,
    config: Arc<Config>,
    shutdown: CancellationToken,
}

impl ResultExporter {
    /// Open the configured SQLite database and build the service
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let db = Database::new(&config.persistence.database_path).await?;
        tracing::info!(
            database = %config.persistence.database_path.display(),
            "result store opened"
        );
        Ok(Self::with_source(Arc::new(db), config))
    }

    /// Build the service over any result source
    pub fn with_source(source: Arc<dyn ResultSource>, config: Config) -> Self {
        let orchestrator = ExportOrchestrator::new(source.clone(), config.export.clone());
        Self {
            source,
            orchestrator,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Service configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// One page of a task's results for display
    ///
    /// `page` is 1-based; `page_size` must be in `1..=MAX_BROWSE_PAGE_SIZE`.
    pub async fn browse(&self, task_id: TaskId, page: u32, page_size: u32) -> Result<ResultPage> {
        if page == 0 {
            return Err(invalid("page", "must be at least 1"));
        }
        if page_size == 0 || page_size > MAX_BROWSE_PAGE_SIZE {
            return Err(invalid(
                "pageSize",
                &format!("must be between 1 and {}", MAX_BROWSE_PAGE_SIZE),
            ));
        }

        let (total, data) = self.source.browse_results(task_id, page, page_size).await?;
        Ok(ResultPage {
            page,
            page_size,
            total,
            data,
        })
    }

    /// Run an export; the result must be served and then dropped
    pub async fn export(
        &self,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        self.orchestrator.run(request, cancel).await
    }

    /// Server-wide shutdown token; per-request tokens are children of it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel in-flight exports and stop the API server
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");
        self.shutdown.cancel();
        Ok(())
    }

    /// Spawn the REST API server on the configured bind address
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let exporter = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(exporter, config).await })
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::Validation(ValidationError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
