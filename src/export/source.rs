//! Collaborator interface consumed by the export pipeline

use async_trait::async_trait;

use crate::Result;
use crate::types::{Project, ResultRecord, Task, TaskId};

/// Read access to stored results and the metadata needed to export them
///
/// The export core only ever reads through this trait. [`Database`](crate::Database)
/// is the production implementation.
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Fetch up to `limit` records of `task_id` whose ID is greater than
    /// `after_id`, ascending by ID
    async fn fetch_results_after(
        &self,
        task_id: TaskId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<ResultRecord>>;

    /// Fetch one 1-based browse page and the total record count of the task
    async fn browse_results(
        &self,
        task_id: TaskId,
        page: u32,
        page_size: u32,
    ) -> Result<(i64, Vec<ResultRecord>)>;

    /// Look up a task
    async fn find_task(&self, task_id: TaskId) -> Result<Option<Task>>;

    /// Look up a project
    async fn find_project(&self, project_id: i64) -> Result<Option<Project>>;
}
