//! Core types for result-export

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Unique identifier for a crawl task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for i64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for TaskId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl sqlx::Type<sqlx::Sqlite> for TaskId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for TaskId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for TaskId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// One stored unit of captured output for a task
///
/// `payload` is the stored text of a field-name → value mapping. Records of
/// the same task may carry different field sets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Monotonically increasing record ID
    pub id: i64,
    /// Task this record belongs to
    pub task_id: TaskId,
    /// Stored payload text (a JSON object of string values)
    pub payload: String,
    /// Unix timestamp when the record was stored
    pub created_at: i64,
}

/// A crawl task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task ID
    pub id: TaskId,
    /// Owning project
    pub project_id: i64,
}

/// A project owning one or more tasks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    /// Project ID
    pub id: i64,
    /// Project name, used for table and file naming
    pub name: String,
    /// Free-form project settings
    #[schema(value_type = Object)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    /// Read an integer setting, falling back to `default`
    ///
    /// Accepts JSON integers and numeric strings; anything else yields the default.
    pub fn get_int_setting(&self, key: &str, default: i64) -> i64 {
        match self.settings.get(key) {
            Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(default),
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Lowercased project name used in SQL table names and file names
    pub fn slug(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Supported export formats
///
/// Parsed once at request entry; never re-evaluated per record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `insert into` statements, one per record
    Sql,
    /// Comma-separated values with a header row
    Csv,
    /// One stored JSON payload per line
    Json,
}

impl ExportFormat {
    /// All supported formats, in allow-list order
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Sql, ExportFormat::Csv, ExportFormat::Json];

    /// Lowercase name, also used as the artifact file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Sql => "sql",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnsupportedFormat {
                format: s.to_string(),
            })
    }
}

/// Export pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportStage {
    /// Checking task, project and format
    Validating,
    /// Fetching the next page of records
    Paginating,
    /// Encoding a page into the buffer
    Encoding,
    /// Writing the buffer to the artifact
    Flushing,
    /// Building the archive
    Compressing,
    /// Streaming the archive to the caller
    Serving,
    /// Finished successfully
    Done,
    /// Aborted; all resources released
    Failed,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportStage::Validating => "validating",
            ExportStage::Paginating => "paginating",
            ExportStage::Encoding => "encoding",
            ExportStage::Flushing => "flushing",
            ExportStage::Compressing => "compressing",
            ExportStage::Serving => "serving",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One page of the browse listing
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    pub page_size: u32,
    /// Total number of records for the task
    pub total: i64,
    /// Records on this page, ascending by ID
    pub data: Vec<ResultRecord>,
}
