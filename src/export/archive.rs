//! tar.gz archiving of finished artifacts

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, ExportError, Result};

/// Compression setting used by the archiver
#[derive(Debug, Clone, Copy)]
pub struct Archiver {
    level: u32,
}

impl Archiver {
    /// Create an archiver with a gzip level (clamped to 0..=9)
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    /// Gzip level in use
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Pack `source` into a single-entry tar.gz at `dest`
    ///
    /// The entry is stored as `entry_name`. Returns the archive size, or
    /// `None` when `cancel` fired before the archive was finalized. A partial
    /// archive is removed on failure and on cancellation.
    pub async fn archive(
        &self,
        source: &Path,
        dest: &Path,
        entry_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<u64>> {
        let level = self.level;
        let source = source.to_path_buf();
        let dest = dest.to_path_buf();
        let entry_name = entry_name.to_string();
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || {
            let result = build_archive(&source, &dest, &entry_name, level, &cancel);
            if !matches!(result, Ok(Some(_))) {
                let _ = std::fs::remove_file(&dest);
            }
            result.map_err(|reason| {
                Error::Export(ExportError::Compression {
                    path: source.clone(),
                    reason,
                })
            })
        })
        .await
        .map_err(|e| Error::Other(format!("archive task panicked: {}", e)))?
    }
}

fn build_archive(
    source: &Path,
    dest: &Path,
    entry_name: &str,
    level: u32,
    cancel: &CancellationToken,
) -> std::result::Result<Option<u64>, String> {
    let file = File::create_new(dest).map_err(|e| e.to_string())?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::new(level));
    let mut builder = tar::Builder::new(encoder);

    builder
        .append_path_with_name(source, entry_name)
        .map_err(|e| e.to_string())?;

    if cancel.is_cancelled() {
        return Ok(None);
    }

    let encoder = builder.into_inner().map_err(|e| e.to_string())?;
    let writer = encoder.finish().map_err(|e| e.to_string())?;
    let file = writer.into_inner().map_err(|e| e.error().to_string())?;
    file.sync_all().map_err(|e| e.to_string())?;

    let size = file.metadata().map_err(|e| e.to_string())?.len();
    Ok(Some(size))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[tokio::test]
    async fn archive_holds_single_named_entry() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("artifact.sql");
        std::fs::write(&source, b"insert into t_proj(a) values ('1');\n").unwrap();
        let dest = dir.path().join("artifact.sql.tar.gz");

        let size = Archiver::new(6)
            .archive(&source, &dest, "proj-1-100.sql", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(size, std::fs::metadata(&dest).unwrap().len());

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&dest).unwrap()));
        let mut entries = archive.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(
            entry.path().unwrap().to_str().unwrap(),
            "proj-1-100.sql"
        );
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "insert into t_proj(a) values ('1');\n");
        drop(entry);
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn missing_source_fails_and_leaves_no_archive() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("missing.csv");
        let dest = dir.path().join("missing.csv.tar.gz");

        let err = Archiver::new(6)
            .archive(&source, &dest, "missing.csv", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Export(ExportError::Compression { .. })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn cancelled_archive_is_removed() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("artifact.json");
        std::fs::write(&source, b"{\"a\":\"1\"}\n").unwrap();
        let dest = dir.path().join("artifact.json.tar.gz");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let size = Archiver::new(6)
            .archive(&source, &dest, "proj-1-100.json", &cancel)
            .await
            .unwrap();

        assert!(size.is_none());
        assert!(!dest.exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn long_entry_names_are_kept_whole() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("artifact.csv");
        std::fs::write(&source, b"a\n1\n").unwrap();
        let dest = dir.path().join("artifact.csv.tar.gz");
        let entry_name = format!("{}-1-100.csv", "p".repeat(300));

        Archiver::new(6)
            .archive(&source, &dest, &entry_name, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&dest).unwrap()));
        let mut entries = archive.entries().unwrap();
        let entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str().unwrap(), entry_name);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(Archiver::new(42).level(), 9);
        assert_eq!(Archiver::new(0).level(), 0);
    }
}
