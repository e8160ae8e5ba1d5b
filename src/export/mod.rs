//! Result export pipeline
//!
//! Drains all stored results of a task in cursor order, re-encodes every record
//! into the requested format, writes the encoded stream to a temporary file,
//! packs it into a tar.gz archive and hands the archive back for streaming.
//!
//! ## Submodules
//!
//! - [`source`] - [`ResultSource`], the read interface the pipeline consumes
//! - [`paginator`] - [`CursorPaginator`], exclusive-lower-bound paging
//! - [`encoder`] - [`RecordEncoder`] for SQL, CSV and JSON lines
//! - [`writer`] - [`StreamWriter`], one buffered write per page
//! - [`transient`] - [`TransientWorkspace`], per-export scratch directory
//! - [`archive`] - [`Archiver`], tar.gz packing off the async runtime
//! - [`orchestrator`] - [`ExportOrchestrator`], the stage machine tying it together

pub mod archive;
pub mod encoder;
pub mod orchestrator;
pub mod paginator;
pub mod source;
pub mod transient;
pub mod writer;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_support;

pub use archive::Archiver;
pub use encoder::{FieldRow, RecordEncoder};
pub use orchestrator::{ExportArtifact, ExportOrchestrator, ExportRequest};
pub use paginator::CursorPaginator;
pub use source::ResultSource;
pub use transient::{TransientWorkspace, artifact_file_name, scratch_file_name};
pub use writer::StreamWriter;
