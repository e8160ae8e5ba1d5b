//! Result storage and paging queries.
//!
//! Two read modes are offered over the same table:
//! - cursor mode ([`Database::export_results`]) used by exports, which pages
//!   with an exclusive lower bound on `id` and never skips or repeats rows
//!   even while new results are being appended
//! - offset mode ([`Database::select_results`]) used by the browse listing

use crate::types::{ResultRecord, TaskId};
use crate::{Error, Result};

use super::Database;

impl Database {
    /// Store a result payload for a task and return the new record ID
    pub async fn insert_result(&self, task_id: TaskId, payload: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO results (task_id, result, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(task_id)
        .bind(payload)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch up to `limit` results of a task with `id > after_id`, ascending by ID
    pub async fn export_results(
        &self,
        task_id: TaskId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<ResultRecord>> {
        let rows = sqlx::query_as::<_, ResultRecord>(
            r#"
            SELECT id, task_id, result AS payload, created_at
            FROM results
            WHERE task_id = ? AND id > ?
            ORDER BY id ASC
            LIMIT ?
            "#,
        )
        .bind(task_id)
        .bind(after_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows)
    }

    /// Fetch one browse page of a task's results together with the total count
    ///
    /// `page` is 1-based. Results are ordered ascending by ID.
    pub async fn select_results(
        &self,
        task_id: TaskId,
        page: u32,
        page_size: u32,
    ) -> Result<(i64, Vec<ResultRecord>)> {
        let total = self.count_results(task_id).await?;
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let rows = sqlx::query_as::<_, ResultRecord>(
            r#"
            SELECT id, task_id, result AS payload, created_at
            FROM results
            WHERE task_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(task_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok((total, rows))
    }

    /// Count the results stored for a task
    pub async fn count_results(&self, task_id: TaskId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}
