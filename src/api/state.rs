//! Application state for the API server

use crate::{Config, ResultExporter};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// The export service
    pub exporter: Arc<ResultExporter>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(exporter: Arc<ResultExporter>, config: Arc<Config>) -> Self {
        Self { exporter, config }
    }
}
