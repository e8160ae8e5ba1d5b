//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`results`] - Results listing and export download
//! - [`system`] - Health, OpenAPI

use serde::{Deserialize, Serialize};

mod results;
mod system;

pub use results::*;
pub use system::*;

fn default_export_format() -> String {
    "sql".to_string()
}

/// Query parameters for GET /results
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ResultQuery {
    /// Task whose results are listed; missing or 0 yields an empty listing
    pub task_id: Option<i64>,
    /// 1-based page number (default: 1)
    pub page: Option<u32>,
    /// Records per page, clamped to 1..=1000 (default: 20)
    pub page_size: Option<u32>,
}

/// Query parameters for GET /results/export
#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Export format: sql, csv or json (default: sql)
    #[serde(default = "default_export_format")]
    pub format: String,
    /// Task to export
    pub task_id: Option<i64>,
}
