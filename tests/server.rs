mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use indexed_browser::router;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_acknowledges() {
    let world = world();
    let app = router(Arc::new(engine(&world)));

    let response = app
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Browser automation engine is running");
    // Health does not touch the browser
    assert_eq!(world.lock().unwrap().launches, 0);
}

#[tokio::test]
async fn action_endpoint_returns_flat_result() {
    let world = world();
    add_page(
        &world,
        "https://shop.test/",
        PageFixture::new("Shop", vec![FakeElement::button("Buy")]),
    );
    let app = router(Arc::new(engine(&world)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/automation/navigate_to")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"url": "https://shop.test/"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], "https://shop.test/");
    assert_eq!(body["title"], "Shop");
    assert_eq!(body["element_count"], 1);
    assert_eq!(body["interactive_elements"][0]["text"], "Buy");
    assert!(body["ocr_text"].is_string());
}

#[tokio::test]
async fn engine_failures_are_reported_with_200() {
    let world = world();
    let app = router(Arc::new(engine(&world)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/automation/click_element")
                .body(Body::from(r#"{"index": 4}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn parameterless_action_accepts_empty_body() {
    let world = world();
    let app = router(Arc::new(engine(&world)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/automation/scroll_down")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let world = world();
    let app = router(Arc::new(engine(&world)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/automation/teleport")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}
