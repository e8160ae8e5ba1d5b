use super::*;
use crate::export::test_support::MemorySource;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;


/// Router over an in-memory source whose exports land in a fresh temp dir
fn create_test_app(source: MemorySource) -> (Router, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.export.temp_dir = temp_dir.path().to_path_buf();
    config.server.api.swagger_ui = false;

    let exporter = Arc::new(ResultExporter::with_source(
        Arc::new(source),
        config.clone(),
    ));
    (create_router(exporter, Arc::new(config)), temp_dir)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.export.temp_dir = temp_dir.path().to_path_buf();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let exporter = Arc::new(ResultExporter::with_source(
        Arc::new(MemorySource::new()),
        config,
    ));

    let handle = exporter.spawn_api_server();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    exporter.shutdown().await.unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _temp_dir) = create_test_app(MemorySource::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[test]
fn test_cors_specific_origins() {
    // Only checks construction; invalid origins are skipped
    let _layer = build_cors_layer(&[
        "http://localhost:3000".to_string(),
        "not a header\u{7f}".to_string(),
    ]);
}
