//! Export pipeline driver
//!
//! [`ExportOrchestrator::run`] walks one export through its stages:
//!
//! ```text
//! Validating → Paginating → Encoding → Flushing ─┐
//!                   ▲                             │ until a short page
//!                   └─────────────────────────────┘
//!            → Compressing → Serving → Done
//! ```
//!
//! Any stage can fail. Validation happens before anything touches the disk.
//! After that, every file the export creates lives in a
//! [`TransientWorkspace`], so returning early from any stage removes them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ExportConfig, SETTINGS_EXPORT_PAGE_SIZE};
use crate::error::{Error, ExportError, Result, ValidationError};
use crate::types::{ExportFormat, ExportStage, TaskId};

use super::archive::Archiver;
use super::encoder::RecordEncoder;
use super::paginator::CursorPaginator;
use super::transient::{TransientWorkspace, artifact_file_name, scratch_file_name};
use super::writer::StreamWriter;
use super::ResultSource;

/// Parameters of one export
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Task whose results are exported
    pub task_id: TaskId,
    /// Requested format name, matched case-insensitively
    pub format: String,
    /// Page size override; the project setting is used when absent
    pub page_size: Option<usize>,
}

impl ExportRequest {
    /// Request with the project's configured page size
    pub fn new(task_id: TaskId, format: impl Into<String>) -> Self {
        Self {
            task_id,
            format: format.into(),
            page_size: None,
        }
    }
}

/// Finished, compressed export ready to be served
///
/// Owns the scratch directory; dropping the artifact deletes the archive.
/// Call [`complete`](Self::complete) once the archive has been delivered in
/// full; an artifact dropped without it is logged as released early.
#[derive(Debug)]
pub struct ExportArtifact {
    task_id: TaskId,
    format: ExportFormat,
    download_name: String,
    archive_path: PathBuf,
    archive_size: u64,
    artifact_size: u64,
    records: u64,
    pages: usize,
    workspace: TransientWorkspace,
    delivered: bool,
}

impl ExportArtifact {
    /// Task the artifact was built from
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Export format
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// File name offered to the client
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Path of the tar.gz archive
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Archive size in bytes
    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    /// Size of the uncompressed artifact in bytes
    pub fn artifact_size(&self) -> u64 {
        self.artifact_size
    }

    /// Number of records that produced output
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Number of page fetches issued
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Scratch directory holding the archive
    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Mark the archive as fully delivered and release it
    pub fn complete(mut self) {
        self.delivered = true;
    }
}

impl Drop for ExportArtifact {
    fn drop(&mut self) {
        if self.delivered {
            info!(
                task_id = self.task_id.0,
                stage = %ExportStage::Done,
                download = %self.download_name,
                "export delivered"
            );
        } else {
            debug!(
                task_id = self.task_id.0,
                download = %self.download_name,
                "export artifact released before delivery completed"
            );
        }
    }
}

/// Runs exports against a [`ResultSource`]
pub struct ExportOrchestrator {
    source: Arc<dyn ResultSource>,
    config: ExportConfig,
    archiver: Archiver,
}

impl ExportOrchestrator {
    /// Create an orchestrator
    pub fn new(source: Arc<dyn ResultSource>, config: ExportConfig) -> Self {
        let archiver = Archiver::new(config.compression_level);
        Self {
            source,
            config,
            archiver,
        }
    }

    /// Export configuration in use
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Run one export to completion
    ///
    /// On error every temporary file created for the export has already been
    /// removed when this returns.
    pub async fn run(
        &self,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let result = self.execute(request, cancel).await;

        if let Err(e) = &result {
            error!(
                task_id = request.task_id.0,
                format = %request.format,
                stage = %ExportStage::Failed,
                error = %e,
                "export failed"
            );
        }

        result
    }

    async fn execute(
        &self,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let task_id = request.task_id;
        enter(task_id, ExportStage::Validating);

        let task = self
            .source
            .find_task(task_id)
            .await?
            .ok_or(ValidationError::TaskNotFound { task_id: task_id.0 })?;

        let project = self
            .source
            .find_project(task.project_id)
            .await?
            .ok_or(ValidationError::ProjectNotFound {
                project_id: task.project_id,
            })?;

        let format: ExportFormat = request.format.parse()?;

        let page_size = match request.page_size {
            Some(size) => self.config.effective_page_size(size as i64),
            None => self.config.effective_page_size(project.get_int_setting(
                SETTINGS_EXPORT_PAGE_SIZE,
                self.config.default_page_size as i64,
            )),
        };

        info!(
            task_id = task_id.0,
            project = %project.name,
            format = %format,
            page_size,
            "starting export"
        );

        let workspace = TransientWorkspace::create(&self.config.temp_dir)?;
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let file_name = artifact_file_name(&project, task_id, format, timestamp_ms);
        let artifact_path = workspace.allocate(&scratch_file_name(format));

        let mut writer = StreamWriter::create(artifact_path.clone()).await?;
        let mut encoder = RecordEncoder::new(format, &project);
        writer.write_preamble(encoder.preamble()).await?;

        let mut paginator = CursorPaginator::new(self.source.as_ref(), task_id, page_size);
        let mut records = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(task_id));
            }

            enter(task_id, ExportStage::Paginating);
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(task_id)),
                page = paginator.next_page() => page?,
            };

            if !page.is_empty() {
                enter(task_id, ExportStage::Encoding);
                records += encoder.encode_page(&page, writer.buffer_mut())? as u64;

                enter(task_id, ExportStage::Flushing);
                writer.flush_page().await?;
            }

            if paginator.is_exhausted() {
                break;
            }
        }

        let artifact_size = writer.finish().await?;

        if cancel.is_cancelled() {
            return Err(cancelled(task_id));
        }

        enter(task_id, ExportStage::Compressing);
        let download_name = format!("{file_name}.tar.gz");
        let archive_path = workspace.allocate(&format!("{}.tar.gz", scratch_file_name(format)));
        let Some(archive_size) = self
            .archiver
            .archive(&artifact_path, &archive_path, &file_name, cancel)
            .await?
        else {
            return Err(cancelled(task_id));
        };

        if let Err(e) = tokio::fs::remove_file(&artifact_path).await {
            warn!(
                path = %artifact_path.display(),
                error = %e,
                "failed to remove uncompressed artifact"
            );
        }

        if cancel.is_cancelled() {
            return Err(cancelled(task_id));
        }

        info!(
            task_id = task_id.0,
            records,
            pages = paginator.pages_fetched(),
            artifact_size,
            archive_size,
            "export complete"
        );
        enter(task_id, ExportStage::Serving);

        Ok(ExportArtifact {
            task_id,
            format,
            download_name,
            archive_path,
            archive_size,
            artifact_size,
            records,
            pages: paginator.pages_fetched(),
            workspace,
            delivered: false,
        })
    }
}

fn enter(task_id: TaskId, stage: ExportStage) {
    debug!(task_id = task_id.0, stage = %stage, "export stage");
}

fn cancelled(task_id: TaskId) -> Error {
    Error::Export(ExportError::Cancelled { task_id: task_id.0 })
}
