//! Routing, authentication and content negotiation.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{app, get, json_body};

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app();
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_lists_files_path() {
    let app = app();
    let request = Request::get("/openapi.json").body(Body::empty()).unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/api/files"].is_object());
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthorized() {
    let app = app();

    let response = app
        .send(Request::get("/api/files").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);

    let response = app.send(get("/api/files", "no-such-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_methods_not_allowed() {
    let app = app();
    let request = Request::put("/api/files")
        .header(header::AUTHORIZATION, "Bearer coo-token")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Method PUT not allowed.");
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let app = app();
    let request = Request::post("/api/files")
        .header(header::AUTHORIZATION, "Bearer coo-token")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();

    let response = app.send(get("/api/files", "coo-token")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_blob_directory_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("general")).unwrap();
    std::fs::write(dir.path().join("general/1-2-a.pdf"), b"%PDF").unwrap();
    let app = common::app_with_options(tenderbox_api::RouterOptions {
        blob_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });

    let response = app
        .send(Request::get("/blobs/general/1-2-a.pdf").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let missing = app
        .send(Request::get("/blobs/general/nope.pdf").body(Body::empty()).unwrap())
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversize_body_rejected_before_handler() {
    let app = common::app_with_options(tenderbox_api::RouterOptions {
        max_body_bytes: 16,
        ..Default::default()
    });
    let request = common::post_json("coo-token", serde_json::json!({"links": [{"url": "https://a.example"}]}));

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.index.is_empty());
}
