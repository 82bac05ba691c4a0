//! JSON feed tests driven through the router without a socket.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{advance_windows, start, TICK};
use pulse_lib::api;
use pulse_lib::core::PageConfig;
use pulse_lib::{Op, OpScope, Telemetry, Workers};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(window_len: usize) -> (Telemetry, Workers, Router) {
    let (telemetry, workers) = start(window_len);
    let router = api::router(telemetry.clone(), PageConfig::default(), TICK);
    (telemetry, workers, router)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_metric_windows() {
    let (telemetry, _workers, router) = app(4);
    for _ in 0..3 {
        telemetry.record_metric("reqs", 1, 512.0).await.unwrap();
    }
    advance_windows(1).await;

    let (status, body) = get(&router, "/json/metrics/reqs?start=0&stop=2000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([0.0, 3.0]));

    let (_, body) = get(&router, "/json/metrics/reqs?start=1000&stop=2000&op=sum").await;
    assert_eq!(body, json!([1536.0]));

    let (_, body) = get(&router, "/json/metrics/reqs?start=0&stop=4000&op=average").await;
    assert_eq!(body, json!([0.0, 0.0, 0.0, 512.0]));

    let (status, body) = get(&router, "/json/metrics/reqs?start=500&stop=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test(start_paused = true)]
async fn test_metric_errors() {
    let (telemetry, _workers, router) = app(4);
    telemetry.record_metric("reqs", 1, 1.0).await.unwrap();

    let (status, body) = get(&router, "/json/metrics/missing?start=0&stop=1000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, _) = get(&router, "/json/metrics/reqs?start=0&stop=5000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, "/json/metrics/reqs?start=2000&stop=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, "/json/metrics/reqs?start=0&stop=1000&op=median").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&router, "/json/metrics/reqs?stop=1000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("start or stop"));
}

#[tokio::test(start_paused = true)]
async fn test_definitions_and_page() {
    let (telemetry, _workers, router) = app(4);
    telemetry
        .define_metric("reqs", Op::Count, "Requests")
        .await
        .unwrap();
    telemetry
        .define_metric("cpu", OpScope::All, "CPU")
        .await
        .unwrap();

    let (status, body) = get(&router, "/json/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"name": "cpu", "op": "average", "displayName": "CPU"},
            {"name": "cpu", "op": "count", "displayName": "CPU"},
            {"name": "cpu", "op": "sum", "displayName": "CPU"},
            {"name": "reqs", "op": "count", "displayName": "Requests"},
        ])
    );

    let (status, body) = get(&router, "/json/page").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Pulse");
    assert_eq!(body["image"], "web/pulse36.png");
    assert_eq!(body["readings"], json!(["CPU", "CPU", "CPU", "Requests"]));
}

#[tokio::test(start_paused = true)]
async fn test_notes_feed() {
    let (telemetry, _workers, router) = app(4);
    telemetry.record_note("version", "1.4.2").await.unwrap();
    telemetry.record_note("OK", "up").await.unwrap();

    let (status, body) = get(&router, "/json/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"key": "OK", "value": "up"},
            {"key": "version", "value": "1.4.2"},
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_nested_router() {
    let (telemetry, _workers, router) = app(4);
    telemetry.record_note("OK", "up").await.unwrap();
    let nested = api::nest_at(api::DEFAULT_PATH, router);

    let (status, body) = get(&nested, "/pulse/json/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["key"], "OK");

    let response = nested
        .oneshot(Request::builder().uri("/json/notes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
