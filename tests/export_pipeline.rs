//! End-to-end export tests against a real SQLite database
//!
//! Results are stored through [`Database`], exported through
//! [`ResultExporter`] and, for the HTTP cases, requested through the router.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{scratch_entries, seed, test_config, unpack};
use result_export::api::create_router;
use result_export::{Error, ExportError, ExportRequest, ResultExporter, TaskId, ValidationError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

#[tokio::test]
async fn csv_export_spans_pages_with_single_header() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let task_id = seed(
        &config,
        "Shop",
        json!({ "export_page_size": 2 }),
        &[
            r#"{"title":"a","price":"1"}"#,
            r#"{"price":"2","title":"b, c"}"#,
            "{}",
            r#"{"title":"d","price":"4"}"#,
        ],
    )
    .await;
    let exporter = ResultExporter::new(config.clone()).await.unwrap();

    let artifact = exporter
        .export(&ExportRequest::new(task_id, "CSV"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(artifact.records(), 3);
    assert_eq!(artifact.pages(), 3);
    let (name, contents) = unpack(artifact.archive_path());
    assert!(name.starts_with(&format!("shop-{}-", task_id)));
    assert!(name.ends_with(".csv"));
    assert_eq!(contents, "\u{feff}price,title\n1,a\n2,\"b, c\"\n4,d\n");

    artifact.complete();
    assert_eq!(scratch_entries(&config), 0);
}

#[tokio::test]
async fn json_export_lines_match_stored_records() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let stored = [r#"{"b":"1","a":"2"}"#, r#"{ "nested" : "x" }"#];
    let task_id = seed(&config, "p", json!({}), &stored).await;
    let exporter = ResultExporter::new(config.clone()).await.unwrap();

    let artifact = exporter
        .export(&ExportRequest::new(task_id, "json"), &CancellationToken::new())
        .await
        .unwrap();

    let (_, contents) = unpack(artifact.archive_path());
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, stored);
    for (line, original) in lines.iter().zip(stored) {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed, serde_json::from_str::<serde_json::Value>(original).unwrap());
    }
}

#[tokio::test]
async fn zero_record_task_exports_successfully() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let task_id = seed(&config, "empty", json!({}), &[]).await;
    let exporter = ResultExporter::new(config.clone()).await.unwrap();

    let artifact = exporter
        .export(&ExportRequest::new(task_id, "sql"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(artifact.records(), 0);
    assert_eq!(unpack(artifact.archive_path()).1, "");
}

#[tokio::test]
async fn failures_leave_no_scratch_files() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let task_id = seed(&config, "p", json!({}), &[r#"{"a":"1"}"#, "oops"]).await;
    let exporter = ResultExporter::new(config.clone()).await.unwrap();
    let cancel = CancellationToken::new();

    let err = exporter
        .export(&ExportRequest::new(task_id, "xml"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnsupportedFormat { .. })
    ));
    assert_eq!(scratch_entries(&config), 0);

    let err = exporter
        .export(&ExportRequest::new(TaskId(task_id.get() + 100), "sql"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::TaskNotFound { .. })
    ));

    let err = exporter
        .export(&ExportRequest::new(task_id, "sql"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Export(ExportError::MalformedRecord { .. })
    ));
    assert_eq!(scratch_entries(&config), 0);

    exporter.shutdown().await.unwrap();
    let err = exporter
        .export(
            &ExportRequest::new(task_id, "json"),
            &exporter.shutdown_token().child_token(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Export(ExportError::Cancelled { .. })));
    assert_eq!(scratch_entries(&config), 0);
}

#[tokio::test]
async fn http_export_streams_attachment() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let task_id = seed(&config, "Proj", json!({}), &[r#"{"a":"O'Brien","b":"x\\y"}"#]).await;
    let exporter = Arc::new(ResultExporter::new(config.clone()).await.unwrap());
    let app = create_router(exporter, Arc::new(config.clone()));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/results/export?format=sql&taskId={}", task_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with(&format!("attachment; filename=\"proj-{}-", task_id)));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(scratch_entries(&config), 0);

    let archive = root.path().join("download.tar.gz");
    std::fs::write(&archive, &body).unwrap();
    assert_eq!(
        unpack(&archive).1,
        "insert into t_proj(a,b) values ('O''Brien','x\\\\y');\n"
    );
}

#[tokio::test]
async fn http_browse_lists_stored_results() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(&root);
    let task_id = seed(
        &config,
        "p",
        json!({}),
        &[r#"{"a":"1"}"#, r#"{"a":"2"}"#, r#"{"a":"3"}"#],
    )
    .await;
    let exporter = Arc::new(ResultExporter::new(config.clone()).await.unwrap());
    let app = create_router(exporter, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/results?taskId={}&pageSize=2&page=2", task_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 3);
    assert_eq!(json["data"][0]["payload"], r#"{"a":"3"}"#);
}
