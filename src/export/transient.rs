//! Per-export scratch directories
//!
//! Every export gets its own directory with a random name under the configured
//! temp root. The directory and everything inside it is removed when the
//! [`TransientWorkspace`] is dropped, whichever way the export ends.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, ExportError, Result};
use crate::types::{ExportFormat, Project, TaskId};

/// Owns one export's scratch directory
#[derive(Debug)]
pub struct TransientWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TransientWorkspace {
    /// Create a fresh scratch directory under `parent`
    pub fn create(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).map_err(|e| workspace_error(parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix("export-")
            .tempdir_in(parent)
            .map_err(|e| workspace_error(parent, e))?;
        let path = dir.path().to_path_buf();

        tracing::debug!(path = %path.display(), "created export workspace");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Scratch directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a file named `name` inside the workspace
    pub fn allocate(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TransientWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "removed export workspace"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove export workspace"
                ),
            }
        }
    }
}

fn workspace_error(path: &Path, e: std::io::Error) -> Error {
    Error::Export(ExportError::Write {
        path: path.to_path_buf(),
        reason: format!("failed to create export workspace: {}", e),
    })
}

/// On-disk artifact name inside a workspace: `artifact.<format>`
///
/// The workspace directory already makes the path unique, so the stored file
/// never carries the project name and its length does not depend on it.
pub fn scratch_file_name(format: ExportFormat) -> String {
    format!("artifact.{format}")
}

/// Artifact name offered to clients and stored in the archive:
/// `<project>-<task id>-<timestamp millis>.<format>`
///
/// Characters outside `[a-z0-9._-]` in the project part are replaced with `_`
/// so the name is safe both on disk and inside a `Content-Disposition` header.
pub fn artifact_file_name(
    project: &Project,
    task_id: TaskId,
    format: ExportFormat,
    timestamp_ms: i64,
) -> String {
    let slug: String = project
        .slug()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    format!("{slug}-{task_id}-{timestamp_ms}.{format}")
}
