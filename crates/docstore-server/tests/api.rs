//! End-to-end tests for the HTTP API.
//!
//! Drives the router in-process with `oneshot`, backed by a snapshot file in
//! a temp directory.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use docstore_server::config::Config;
use docstore_server::{router, AppState, BODY_LIMIT_BYTES};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "docstore-test-boundary";

/// Test server with its own data directory.
struct TestApp {
    data_dir: TempDir,
    config: Config,
    base_url: String,
}

impl TestApp {
    fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config: Config::default(),
            base_url: String::new(),
        }
    }

    /// Build a fresh router over whatever is on disk (simulates a restart).
    async fn router(&self) -> Router {
        let state = Arc::new(AppState::open(&self.config, self.data_dir.path()).await);
        router(state, &self.config, &self.base_url)
    }

    async fn send(&self, app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload_request(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ==================== CRUD ====================

#[tokio::test]
async fn test_create_get_list() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test
        .send(&app, json_request(Method::POST, "/api/documents", json!({"content": "hello"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["document"]["id"], 1);
    assert_eq!(body["document"]["title"], "Document 1");
    assert_eq!(body["document"]["format"], "markdown");
    assert!(body["document"]["createdAt"].is_string());

    let (status, body) = test.send(&app, empty_request(Method::GET, "/api/documents/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["content"], "hello");

    let (status, body) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["documents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_invalid_payloads() {
    let test = TestApp::new();
    let app = test.router().await;

    for payload in [
        json!({"format": "pdf"}),
        json!({"content": "x", "format": "pdf"}),
        json!({"title": "no content"}),
        json!({"content": 12}),
    ] {
        let (status, body) = test
            .send(&app, json_request(Method::POST, "/api/documents", payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    let (_, body) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn test_create_malformed_json() {
    let test = TestApp::new();
    let app = test.router().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/documents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let (status, body) = test.send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_get_unknown_ids() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test.send(&app, empty_request(Method::GET, "/api/documents/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = test.send(&app, empty_request(Method::GET, "/api/documents/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_keeps_omitted_fields() {
    let test = TestApp::new();
    let app = test.router().await;

    test.send(
        &app,
        json_request(
            Method::POST,
            "/api/documents",
            json!({"title": "Paper", "content": "v1", "format": "latex"}),
        ),
    )
    .await;

    let (status, body) = test
        .send(&app, json_request(Method::PUT, "/api/documents/1", json!({"content": "v2"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["content"], "v2");
    assert_eq!(body["document"]["title"], "Paper");
    assert_eq!(body["document"]["format"], "latex");

    let (status, _) = test
        .send(&app, json_request(Method::PUT, "/api/documents/7", json!({"content": "v2"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = test
        .send(&app, json_request(Method::PUT, "/api/documents/1", json!({"format": "latex"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_retires_id() {
    let test = TestApp::new();
    let app = test.router().await;

    test.send(&app, json_request(Method::POST, "/api/documents", json!({"content": "a"})))
        .await;

    let (status, body) = test.send(&app, empty_request(Method::DELETE, "/api/documents/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());

    let (status, _) = test.send(&app, empty_request(Method::GET, "/api/documents/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = test.send(&app, empty_request(Method::DELETE, "/api/documents/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = test
        .send(&app, json_request(Method::POST, "/api/documents", json!({"content": "b"})))
        .await;
    assert_eq!(body["document"]["id"], 2);
}

// ==================== Upload ====================

#[tokio::test]
async fn test_upload_markdown() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test
        .send(&app, upload_request("file", "notes.md", "text/markdown", b"# Notes\n"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["title"], "notes.md");
    assert_eq!(body["document"]["content"], "# Notes\n");
    assert_eq!(body["document"]["format"], "markdown");
}

#[tokio::test]
async fn test_upload_tex_by_suffix() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test
        .send(
            &app,
            upload_request("file", "paper.tex", "application/octet-stream", b"\\section{A}"),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["format"], "latex");
}

#[tokio::test]
async fn test_upload_too_large() {
    let test = TestApp::new();
    let app = test.router().await;

    let data = vec![b'a'; 11 * 1024 * 1024];
    let (status, body) = test
        .send(&app, upload_request("file", "big.md", "text/markdown", &data))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);

    let (_, body) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn test_upload_beyond_body_limit() {
    let test = TestApp::new();
    let app = test.router().await;

    let data = vec![b'a'; BODY_LIMIT_BYTES + 1024 * 1024];
    let (status, body) = test
        .send(&app, upload_request("file", "big.md", "text/markdown", &data))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);

    let (_, body) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn test_upload_unsupported_type() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test
        .send(&app, upload_request("file", "image.png", "image/png", &[0x89, b'P', b'N', b'G']))
        .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let test = TestApp::new();
    let app = test.router().await;

    let (status, body) = test
        .send(&app, upload_request("attachment", "notes.md", "text/markdown", b"x"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
}

// ==================== Persistence & routing ====================

#[tokio::test]
async fn test_documents_survive_restart() {
    let test = TestApp::new();

    {
        let app = test.router().await;
        for content in ["one", "two", "three"] {
            test.send(&app, json_request(Method::POST, "/api/documents", json!({"content": content})))
                .await;
        }
        test.send(&app, empty_request(Method::DELETE, "/api/documents/3")).await;
    }

    assert!(test.data_dir.path().join("documents.json").exists());

    let app = test.router().await;
    let (_, body) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    let ids: Vec<_> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let (_, body) = test
        .send(&app, json_request(Method::POST, "/api/documents", json!({"content": "four"})))
        .await;
    assert_eq!(body["document"]["id"], 4);
}

#[tokio::test]
async fn test_base_url_nesting() {
    let mut test = TestApp::new();
    test.base_url = "/editor/".to_string();
    let app = test.router().await;

    let (status, _) = test
        .send(&app, empty_request(Method::GET, "/editor/api/documents"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_index() {
    let mut test = TestApp::new();
    let static_dir = test.data_dir.path().join("public");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<h1>editor</h1>").unwrap();
    std::fs::write(static_dir.join("app.js"), "console.log(1)").unwrap();
    test.config.static_dir = Some(static_dir);
    let app = test.router().await;

    let response = app.clone().oneshot(empty_request(Method::GET, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>editor</h1>");

    let response = app.clone().oneshot(empty_request(Method::GET, "/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // API routes still take precedence
    let (status, _) = test.send(&app, empty_request(Method::GET, "/api/documents")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_headers() {
    let test = TestApp::new();
    let app = test.router().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/documents")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
