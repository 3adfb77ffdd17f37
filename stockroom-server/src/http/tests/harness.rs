use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use tower::util::ServiceExt;

use crate::config::StockroomConfig;
use crate::db::{create_pool, run_migrations};
use crate::http::{build_router, AppState, ServerConfig};
use crate::storage::MemoryImageStore;

const BOUNDARY: &str = "stockroom-test-boundary";

pub(super) struct TestHarness {
    _temp: tempfile::TempDir,
    pub(super) state: AppState,
    /// Set when the harness uses the in-memory image store
    memory_images: Option<Arc<MemoryImageStore>>,
    pub(super) router: Router,
}

impl TestHarness {
    /// Temp database with an in-memory image store.
    pub(super) async fn setup() -> Self {
        Self::build(Some(Arc::new(MemoryImageStore::new()))).await
    }

    /// Temp database with images written to the temp uploads dir.
    pub(super) async fn setup_with_fs_images() -> Self {
        Self::build(None).await
    }

    async fn build(memory_images: Option<Arc<MemoryImageStore>>) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = StockroomConfig::with_root(temp.path());
        std::fs::create_dir_all(&config.uploads_dir).expect("mkdir uploads");

        let pool = create_pool(&config.database_path).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");

        let mut state = AppState::new(pool, config);
        if let Some(images) = &memory_images {
            state = state.with_images(images.clone());
        }
        let router = build_router(state.clone(), &ServerConfig::default());
        Self {
            _temp: temp,
            state,
            memory_images,
            router,
        }
    }

    pub(super) fn images(&self) -> &MemoryImageStore {
        self.memory_images.as_deref().expect("harness uses filesystem images")
    }

    pub(super) async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("response")
    }

    pub(super) async fn get(&self, uri: &str) -> Response {
        self.send(empty_request(Method::GET, uri)).await
    }

    pub(super) async fn delete(&self, uri: &str) -> Response {
        self.send(empty_request(Method::DELETE, uri)).await
    }

    pub(super) async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.send(json_request(Method::POST, uri, body)).await
    }

    pub(super) async fn put_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.send(json_request(Method::PUT, uri, body)).await
    }

    /// POST a JSON body and return the new row's id.
    pub(super) async fn create(&self, uri: &str, body: serde_json::Value) -> i64 {
        let response = self.post_json(uri, body).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED, "POST {uri}");
        let payload: serde_json::Value = decode_json(response).await;
        payload["id"].as_i64().expect("id")
    }
}

pub(super) async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body bytes");
    serde_json::from_slice(&bytes).expect("decode json")
}

pub(super) async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body bytes")
        .to_vec()
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub(super) fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json request body")))
        .expect("json request")
}

/// Single-part multipart upload under `field`.
pub(super) fn multipart_request(uri: &str, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("multipart request")
}

/// Multipart form with text fields and an optional `image` file part.
pub(super) fn form_request(
    method: Method,
    uri: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("form request")
}
