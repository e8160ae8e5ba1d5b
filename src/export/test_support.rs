//! In-memory [`ResultSource`] used by unit tests

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DatabaseError, Error, Result};
use crate::export::ResultSource;
use crate::types::{Project, ResultRecord, Task, TaskId};

#[derive(Default)]
struct State {
    projects: HashMap<i64, Project>,
    tasks: HashMap<i64, i64>,
    records: Vec<ResultRecord>,
    next_id: i64,
    fetch_calls: usize,
    cursors: Vec<i64>,
    fail_on_fetch: Option<usize>,
    reverse_pages: bool,
}

/// Result store held in memory with fault injection hooks
#[derive(Default)]
pub(crate) struct MemorySource {
    state: Mutex<State>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Project 1 "Proj" owning `task_id` with `count` records `{"n":"<i>"}`
    pub(crate) fn with_records(task_id: i64, count: usize) -> Self {
        let source = Self::new();
        source.add_project(1, "Proj", serde_json::json!({}));
        source.add_task(task_id, 1);
        for i in 1..=count {
            source.push_result(task_id, &format!(r#"{{"n":"{i}"}}"#));
        }
        source
    }

    pub(crate) fn add_project(&self, id: i64, name: &str, settings: serde_json::Value) {
        let settings = match settings {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        self.state.lock().unwrap().projects.insert(
            id,
            Project {
                id,
                name: name.to_string(),
                settings,
            },
        );
    }

    pub(crate) fn add_task(&self, task_id: i64, project_id: i64) {
        self.state.lock().unwrap().tasks.insert(task_id, project_id);
    }

    pub(crate) fn push_result(&self, task_id: i64, payload: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.records.push(ResultRecord {
            id,
            task_id: TaskId(task_id),
            payload: payload.to_string(),
            created_at: 0,
        });
        id
    }

    /// Fail the `call`-th fetch (1-based)
    pub(crate) fn fail_on_fetch(&self, call: usize) {
        self.state.lock().unwrap().fail_on_fetch = Some(call);
    }

    /// Return every page in descending order
    pub(crate) fn reverse_pages(&self) {
        self.state.lock().unwrap().reverse_pages = true;
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub(crate) fn cursors_seen(&self) -> Vec<i64> {
        self.state.lock().unwrap().cursors.clone()
    }
}

#[async_trait]
impl ResultSource for MemorySource {
    async fn fetch_results_after(
        &self,
        task_id: TaskId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<ResultRecord>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        state.cursors.push(after_id);

        if state.fail_on_fetch == Some(state.fetch_calls) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "injected fault".to_string(),
            )));
        }

        let mut page: Vec<ResultRecord> = state
            .records
            .iter()
            .filter(|r| r.task_id == task_id && r.id > after_id)
            .take(limit)
            .cloned()
            .collect();
        if state.reverse_pages {
            page.reverse();
        }
        Ok(page)
    }

    async fn browse_results(
        &self,
        task_id: TaskId,
        page: u32,
        page_size: u32,
    ) -> Result<(i64, Vec<ResultRecord>)> {
        let state = self.state.lock().unwrap();
        let matching: Vec<&ResultRecord> =
            state.records.iter().filter(|r| r.task_id == task_id).collect();
        let skip = page.saturating_sub(1) as usize * page_size as usize;
        let data = matching
            .iter()
            .skip(skip)
            .take(page_size as usize)
            .map(|r| (*r).clone())
            .collect();
        Ok((matching.len() as i64, data))
    }

    async fn find_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        let state = self.state.lock().unwrap();
        Ok(state.tasks.get(&task_id.0).map(|project_id| Task {
            id: task_id,
            project_id: *project_id,
        }))
    }

    async fn find_project(&self, project_id: i64) -> Result<Option<Project>> {
        Ok(self.state.lock().unwrap().projects.get(&project_id).cloned())
    }
}

/// Unpack a single-entry tar.gz, returning the entry name and contents
pub(crate) fn read_single_entry(path: &Path) -> (String, Vec<u8>) {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut entries = archive.entries().unwrap();
    let mut entry = entries.next().unwrap().unwrap();
    let name = entry.path().unwrap().to_string_lossy().into_owned();
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    drop(entry);
    assert!(entries.next().is_none(), "archive has more than one entry");
    (name, contents)
}
