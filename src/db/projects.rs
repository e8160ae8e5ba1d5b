//! Project and task metadata operations.

use crate::types::{Project, Task, TaskId};
use crate::{Error, Result};

use super::{Database, NewProject, ProjectRow};
use crate::error::DatabaseError;

impl Database {
    /// Insert a project and return its ID
    pub async fn insert_project(&self, project: &NewProject) -> Result<i64> {
        if !project.settings.is_object() {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "settings of project '{}' must be a JSON object",
                project.name
            ))));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, settings, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&project.name)
        .bind(project.settings.to_string())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Get a project by ID
    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, name, settings
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        row.map(Project::try_from).transpose()
    }

    /// Insert a task under a project and return its ID
    pub async fn insert_task(&self, project_id: i64) -> Result<TaskId> {
        let result = sqlx::query("INSERT INTO tasks (project_id, created_at) VALUES (?, ?)")
            .bind(project_id)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(TaskId(result.last_insert_rowid()))
    }

    /// Get a task by ID
    pub async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT id, project_id FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(task)
    }
}
