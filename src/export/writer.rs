//! Buffered artifact writer

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, ExportError, Result};

/// Writes encoded pages to an artifact file
///
/// Each page is encoded into [`buffer_mut`](Self::buffer_mut) and then
/// written with one [`flush_page`](Self::flush_page) call. The buffer keeps
/// its capacity between pages.
pub struct StreamWriter {
    file: File,
    path: PathBuf,
    buffer: Vec<u8>,
    bytes_written: u64,
    flushes: usize,
}

impl StreamWriter {
    /// Create the artifact file; fails if it already exists
    pub async fn create(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| write_error(&path, e))?;

        Ok(Self {
            file,
            path,
            buffer: Vec::new(),
            bytes_written: 0,
            flushes: 0,
        })
    }

    /// Reusable page buffer
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Write bytes that precede all records
    pub async fn write_preamble(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.file
            .write_all(bytes)
            .await
            .map_err(|e| write_error(&self.path, e))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Write the buffered page to the file and clear the buffer
    ///
    /// Returns the number of bytes written.
    pub async fn flush_page(&mut self) -> Result<usize> {
        let len = self.buffer.len();
        if len > 0 {
            self.file
                .write_all(&self.buffer)
                .await
                .map_err(|e| write_error(&self.path, e))?;
            self.bytes_written += len as u64;
            self.flushes += 1;
        }
        self.buffer.clear();
        Ok(len)
    }

    /// Flush, sync and close the file, returning the total size
    pub async fn finish(mut self) -> Result<u64> {
        self.flush_page().await?;
        self.file
            .flush()
            .await
            .map_err(|e| write_error(&self.path, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| write_error(&self.path, e))?;
        Ok(self.bytes_written)
    }

    /// Artifact path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of non-empty page writes
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

fn write_error(path: &Path, e: std::io::Error) -> Error {
    Error::Export(ExportError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
