use axum::http::StatusCode;
use serde_json::{json, Value};

use super::harness::{decode_json, TestHarness};

#[tokio::test]
async fn health_reports_database_and_item_count() {
    let harness = TestHarness::setup().await;
    harness.create("/api/inventory", json!({"name": "Drill"})).await;

    let response = harness.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload: Value = decode_json(response).await;
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["database"], "ok");
    assert_eq!(payload["itemCount"], 1);
    assert_eq!(payload["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_degrades_when_database_is_closed() {
    let harness = TestHarness::setup().await;
    harness.state.pool.close().await;

    let response = harness.get("/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload: Value = decode_json(response).await;
    assert_eq!(payload["status"], "degraded");
    assert_eq!(payload["database"], "unavailable");
    assert!(payload.get("itemCount").is_none());
}
