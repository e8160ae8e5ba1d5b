//! Cursor-based pagination over a task's results

use tracing::debug;

use crate::error::{Error, ExportError, Result};
use crate::types::{ResultRecord, TaskId};

use super::ResultSource;

/// Drains a task's results in ascending ID order, one bounded page at a time
///
/// The cursor is the ID of the last record seen and is used as an exclusive
/// lower bound for the next fetch. A page shorter than the page size marks the
/// end of the data, so when the record count is an exact multiple of the page
/// size one extra (empty) fetch is issued to observe exhaustion.
pub struct CursorPaginator<'a> {
    source: &'a dyn ResultSource,
    task_id: TaskId,
    page_size: usize,
    cursor: i64,
    pages_fetched: usize,
    records_seen: u64,
    exhausted: bool,
}

impl<'a> CursorPaginator<'a> {
    /// Create a paginator starting before the first record
    ///
    /// A page size of zero is treated as one so the loop always makes progress.
    pub fn new(source: &'a dyn ResultSource, task_id: TaskId, page_size: usize) -> Self {
        Self {
            source,
            task_id,
            page_size: page_size.max(1),
            cursor: 0,
            pages_fetched: 0,
            records_seen: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page
    ///
    /// Returns an empty page once the data is exhausted, without touching the
    /// source again.
    pub async fn next_page(&mut self) -> Result<Vec<ResultRecord>> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let page = self
            .source
            .fetch_results_after(self.task_id, self.cursor, self.page_size)
            .await
            .map_err(|e| self.query_error(e.to_string()))?;

        self.pages_fetched += 1;

        if page.len() > self.page_size {
            return Err(self.query_error(format!(
                "source returned {} records for a page of {}",
                page.len(),
                self.page_size
            )));
        }

        let mut previous = self.cursor;
        for record in &page {
            if record.task_id != self.task_id {
                return Err(self.query_error(format!(
                    "record {} belongs to task {}",
                    record.id, record.task_id
                )));
            }
            if record.id <= previous {
                return Err(self.query_error(format!(
                    "record {} is not after cursor {}",
                    record.id, previous
                )));
            }
            previous = record.id;
        }

        if let Some(last) = page.last() {
            self.cursor = last.id;
        }
        self.records_seen += page.len() as u64;

        if page.len() < self.page_size {
            self.exhausted = true;
        }

        debug!(
            task_id = self.task_id.0,
            page = self.pages_fetched,
            records = page.len(),
            cursor = self.cursor,
            exhausted = self.exhausted,
            "fetched result page"
        );

        Ok(page)
    }

    fn query_error(&self, reason: String) -> Error {
        Error::Export(ExportError::Query {
            task_id: self.task_id.0,
            after_id: self.cursor,
            reason,
        })
    }

    /// Whether a short page has been observed
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// ID of the last record returned so far (0 before the first record)
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Number of fetches issued against the source
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Number of records returned so far
    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    /// Effective page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}
