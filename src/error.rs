//! Error types for result-export
//!
//! This module provides the error handling for the crate, including:
//! - Domain-specific error types (Validation, Export, Database)
//! - HTTP status code mapping for API integration
//! - The JSON error envelope returned by every failing endpoint

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for result-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for result-export
///
/// Each variant carries enough context to produce a user-visible message.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "export.temp_dir")
        key: Option<String>,
    },

    /// Request validation failed before any resource was allocated
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Export pipeline failure
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Request validation errors
///
/// Raised while checking an export or browse request against the metadata
/// collaborators. None of these ever leave a temporary file behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The task does not exist
    #[error("task {task_id} not exists")]
    TaskNotFound {
        /// The requested task ID
        task_id: i64,
    },

    /// The project owning the task does not exist
    #[error("project {project_id} not exists")]
    ProjectNotFound {
        /// The project ID referenced by the task
        project_id: i64,
    },

    /// The requested export format is not in the allow-list
    #[error("not supported format: {format}")]
    UnsupportedFormat {
        /// The format string as received
        format: String,
    },

    /// A request parameter is missing or out of range
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the request
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Export pipeline errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Storage fault while fetching a page of results
    #[error("failed to fetch results for task {task_id} after id {after_id}: {reason}")]
    Query {
        /// Task being exported
        task_id: i64,
        /// Cursor value used for the failing fetch
        after_id: i64,
        /// Underlying failure
        reason: String,
    },

    /// A stored payload could not be decoded into a field mapping
    #[error("malformed result record {record_id}: {reason}")]
    MalformedRecord {
        /// ID of the offending record
        record_id: i64,
        /// Decoder message
        reason: String,
    },

    /// Creating or writing the temporary artifact failed
    #[error("failed to write export file {path}: {reason}")]
    Write {
        /// Path of the artifact being written
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Compressing the finished artifact failed
    #[error("failed to compress {path}: {reason}")]
    Compression {
        /// Path of the artifact being compressed
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The request was cancelled before the export finished
    #[error("export of task {task_id} cancelled")]
    Cancelled {
        /// Task being exported
        task_id: i64,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Stored data could not be interpreted
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// API error envelope
///
/// Returned by every endpoint when a request fails.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "status": 404,
///   "code": "task_not_found",
///   "message": "validation error: task 7 not exists",
///   "details": { "task_id": 7 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code of the response
    pub status: u16,

    /// Machine-readable error code (e.g., "unsupported_format")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with status, code and message
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, "validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, "internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::Validation(ValidationError::UnsupportedFormat { .. }) => 400,
            Error::Validation(ValidationError::InvalidParameter { .. }) => 400,

            // 404 Not Found
            Error::Validation(ValidationError::TaskNotFound { .. }) => 404,
            Error::Validation(ValidationError::ProjectNotFound { .. }) => 404,

            // 422 Unprocessable Entity - stored data cannot be exported
            Error::Export(ExportError::MalformedRecord { .. }) => 422,

            // 499 Client Closed Request
            Error::Export(ExportError::Cancelled { .. }) => 499,

            // 502 Bad Gateway - the storage collaborator failed
            Error::Export(ExportError::Query { .. }) => 502,

            // 500 Internal Server Error
            Error::Export(ExportError::Write { .. }) => 500,
            Error::Export(ExportError::Compression { .. }) => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(e) => match e {
                ValidationError::TaskNotFound { .. } => "task_not_found",
                ValidationError::ProjectNotFound { .. } => "project_not_found",
                ValidationError::UnsupportedFormat { .. } => "unsupported_format",
                ValidationError::InvalidParameter { .. } => "invalid_parameter",
            },
            Error::Export(e) => match e {
                ExportError::Query { .. } => "query_error",
                ExportError::MalformedRecord { .. } => "malformed_record",
                ExportError::Write { .. } => "write_error",
                ExportError::Compression { .. } => "compression_error",
                ExportError::Cancelled { .. } => "export_cancelled",
            },
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = error.status_code();
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation(ValidationError::TaskNotFound { task_id }) => {
                Some(serde_json::json!({ "task_id": task_id }))
            }
            Error::Validation(ValidationError::ProjectNotFound { project_id }) => {
                Some(serde_json::json!({ "project_id": project_id }))
            }
            Error::Validation(ValidationError::UnsupportedFormat { format }) => {
                Some(serde_json::json!({
                    "format": format,
                    "supported": ["sql", "csv", "json"],
                }))
            }
            Error::Export(ExportError::MalformedRecord { record_id, .. }) => {
                Some(serde_json::json!({ "record_id": record_id }))
            }
            Error::Export(ExportError::Query {
                task_id, after_id, ..
            }) => Some(serde_json::json!({
                "task_id": task_id,
                "after_id": after_id,
            })),
            _ => None,
        };

        ApiError {
            status,
            code,
            message,
            details,
        }
    }
}
