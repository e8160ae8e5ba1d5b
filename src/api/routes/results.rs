//! Results handlers: paged listing and export download.

use crate::api::AppState;
use crate::api::routes::{ExportQuery, ResultQuery};
use crate::error::{ApiError, Error, ValidationError};
use crate::export::{ExportArtifact, ExportRequest};
use crate::exporter::MAX_BROWSE_PAGE_SIZE;
use crate::types::{ResultPage, TaskId};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, Method, Request, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::services::ServeFile;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Request headers passed through to the file service
const CONDITIONAL_HEADERS: [header::HeaderName; 5] = [
    header::RANGE,
    header::IF_RANGE,
    header::IF_MODIFIED_SINCE,
    header::IF_UNMODIFIED_SINCE,
    header::IF_NONE_MATCH,
];

/// GET /results - Paged listing of a task's results
#[utoipa::path(
    get,
    path = "/results",
    tag = "results",
    params(ResultQuery),
    responses(
        (status = 200, description = "One page of results", body = ResultPage),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_results(
    State(state): State<AppState>,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::validation(rejection.body_text()).into_response(),
    };

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_BROWSE_PAGE_SIZE);

    let task_id = match query.task_id {
        Some(id) if id != 0 => TaskId(id),
        _ => {
            return Json(ResultPage {
                page,
                page_size,
                total: 0,
                data: Vec::new(),
            })
            .into_response();
        }
    };

    match state.exporter.browse(task_id, page, page_size).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /results/export - Export a task's results as a tar.gz download
#[utoipa::path(
    get,
    path = "/results/export",
    tag = "results",
    params(ExportQuery),
    responses(
        (status = 200, description = "Compressed export archive", content_type = "application/gzip"),
        (status = 206, description = "Partial archive for a range request", content_type = "application/gzip"),
        (status = 304, description = "Archive not modified"),
        (status = 400, description = "Missing task or unsupported format", body = ApiError),
        (status = 404, description = "Task or project not found", body = ApiError),
        (status = 422, description = "A stored record could not be decoded", body = ApiError),
        (status = 500, description = "Export failed", body = ApiError),
        (status = 502, description = "Result store failed while paging", body = ApiError)
    )
)]
pub async fn export_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::validation(rejection.body_text()).into_response(),
    };

    let task_id = match query.task_id {
        Some(id) => TaskId(id),
        None => {
            return Error::Validation(ValidationError::InvalidParameter {
                name: "taskId".to_string(),
                reason: "is required".to_string(),
            })
            .into_response();
        }
    };

    // Cancelled if the client goes away while the export is being built
    let cancel = state.exporter.shutdown_token().child_token();
    let guard = cancel.clone().drop_guard();

    let request = ExportRequest::new(task_id, query.format);
    let artifact = match state.exporter.export(&request, &cancel).await {
        Ok(artifact) => artifact,
        Err(e) => return e.into_response(),
    };
    let _ = guard.disarm();

    match serve_artifact(artifact, &headers, cancel).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Stream the archive through `ServeFile` so range and conditional requests
/// are honored. The artifact is dropped, and its files removed, together
/// with the response body; it is marked delivered only when the body ends
/// without cancellation.
async fn serve_artifact(
    artifact: ExportArtifact,
    headers: &HeaderMap,
    cancel: CancellationToken,
) -> Result<Response, Error> {
    let mut file_request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .map_err(|e| Error::Other(format!("failed to build file request: {}", e)))?;
    for name in CONDITIONAL_HEADERS {
        if let Some(value) = headers.get(&name) {
            file_request.headers_mut().insert(name, value.clone());
        }
    }

    let response = match ServeFile::new(artifact.archive_path())
        .oneshot(file_request)
        .await
    {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (mut parts, body) = response.into_parts();
    let stop = cancel.clone().cancelled_owned();

    if parts.status.is_success() {
        let disposition =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.download_name()))
                .map_err(|e| Error::Other(format!("invalid download name: {}", e)))?;
        parts
            .headers
            .insert(header::CONTENT_DISPOSITION, disposition);
        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/gzip"),
        );
    }

    tracing::debug!(
        task_id = artifact.task_id().0,
        status = %parts.status,
        size = artifact.archive_size(),
        "serving export archive"
    );

    // Runs after the last chunk; dropping the body first releases the
    // artifact without marking it delivered
    let delivered = futures::stream::once(async move {
        if !cancel.is_cancelled() {
            artifact.complete();
        }
    })
    .filter_map(|()| async { None::<Result<Bytes, axum::Error>> });

    let stream = Body::new(body)
        .into_data_stream()
        .take_until(stop)
        .chain(delivered);

    Ok(Response::from_parts(parts, Body::from_stream(stream)))
}
