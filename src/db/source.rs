//! [`ResultSource`] backed by SQLite.

use async_trait::async_trait;

use crate::Result;
use crate::export::ResultSource;
use crate::types::{Project, ResultRecord, Task, TaskId};

use super::Database;

#[async_trait]
impl ResultSource for Database {
    async fn fetch_results_after(
        &self,
        task_id: TaskId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<ResultRecord>> {
        self.export_results(task_id, after_id, limit).await
    }

    async fn browse_results(
        &self,
        task_id: TaskId,
        page: u32,
        page_size: u32,
    ) -> Result<(i64, Vec<ResultRecord>)> {
        self.select_results(task_id, page, page_size).await
    }

    async fn find_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        self.get_task(task_id).await
    }

    async fn find_project(&self, project_id: i64) -> Result<Option<Project>> {
        self.get_project(project_id).await
    }
}
