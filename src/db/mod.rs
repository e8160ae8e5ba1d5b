//! Database layer for result-export
//!
//! Handles SQLite persistence for projects, tasks and stored results.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`projects`] - Project and task metadata lookups
//! - [`results`] - Result storage, cursor export queries and browse paging
//! - [`source`] - [`ResultSource`](crate::export::ResultSource) implementation

use crate::error::DatabaseError;
use crate::types::Project;
use crate::{Error, Result};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod projects;
mod results;
mod source;

/// New project to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Project name
    pub name: String,
    /// Project settings (must be a JSON object)
    pub settings: serde_json::Value,
}

/// Project record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    /// Unique database ID
    pub id: i64,
    /// Project name
    pub name: String,
    /// Settings as stored JSON text
    pub settings: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = Error;

    fn try_from(row: ProjectRow) -> Result<Self> {
        let settings = match serde_json::from_str::<serde_json::Value>(&row.settings) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                return Err(Error::Database(DatabaseError::CorruptRow(format!(
                    "settings of project {} is not a JSON object",
                    row.id
                ))));
            }
            Err(e) => {
                return Err(Error::Database(DatabaseError::CorruptRow(format!(
                    "settings of project {} is not valid JSON: {}",
                    row.id, e
                ))));
            }
        };

        Ok(Project {
            id: row.id,
            name: row.name,
            settings,
        })
    }
}

/// Database handle for result-export
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
