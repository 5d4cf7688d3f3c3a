//! API endpoint integration tests

#[path = "../common/mod.rs"]
mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{test_normalizer, StubBackend, IRRELEVANT};
use label_zoo_gateway::api::routes::create_router;
use label_zoo_gateway::backend::BackendRegistry;
use label_zoo_gateway::config::Settings;
use label_zoo_gateway::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_state() -> Arc<AppState> {
    let state = AppState::new(
        Settings::default(),
        Arc::new(BackendRegistry::new()),
        test_normalizer(),
    )
    .unwrap();
    Arc::new(state)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

#[tokio::test]
async fn test_predict_without_backends_returns_empty_lists() {
    let app = create_router(test_state());

    let (status, body) = send(
        app,
        Method::POST,
        "/v1/predict",
        Some(json!({"text_list": ["first", "second"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[], []]));
}

#[tokio::test]
async fn test_predict_concatenates_backend_labels() {
    let state = test_state();
    state
        .backend_registry
        .add(Arc::new(StubBackend::new("toxicity", "class1")))
        .unwrap();
    state
        .backend_registry
        .add(Arc::new(StubBackend::new("topics", "classX")))
        .unwrap();

    let (status, body) = send(
        create_router(state),
        Method::POST,
        "/v1/predict",
        Some(json!({"text_list": ["hello"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([["class1", "classX"]]));
}

#[tokio::test]
async fn test_predict_on_text_normalizes_labels() {
    let state = test_state();
    state
        .backend_registry
        .add(Arc::new(StubBackend::new("toxicity", "class1;classX")))
        .unwrap();

    let (status, body) = send(
        create_router(state),
        Method::POST,
        "/v1/predict_on_text",
        Some(json!({"text_list": ["hello"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([[{"prediction": "mapped_class1", "color": "#FF0000"}]])
    );
}

#[tokio::test]
async fn test_predict_on_text_without_backends_is_irrelevant() {
    let (status, body) = send(
        create_router(test_state()),
        Method::POST,
        "/v1/predict_on_text",
        Some(json!({"text_list": ["hello"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([[{"prediction": IRRELEVANT, "color": "#CCCCCC"}]])
    );
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (status, body) = send(
        create_router(test_state()),
        Method::POST,
        "/v1/predict",
        Some(json!({"texts": "not a list"})),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(body["error"]["type"], json!("invalid_request"));
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_non_json_body_uses_error_shape() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/predict_on_batch")
        .header("content-type", "application/json")
        .body(Body::from("texts=1"))
        .unwrap();

    let response = create_router(test_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["type"], json!("invalid_request"));
}

#[tokio::test]
async fn test_list_backends() {
    let state = test_state();
    let app = create_router(state.clone());

    let (status, body) = send(app.clone(), Method::GET, "/v1/backends", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    state
        .backend_registry
        .add(Arc::new(StubBackend::new("toxicity", "x")))
        .unwrap();

    let (_, body) = send(app, Method::GET, "/v1/backends", None).await;
    assert_eq!(
        body,
        json!([{"model_name": "toxicity", "url": "http://stub:8000/v2"}])
    );
}

#[tokio::test]
async fn test_unregister_backend() {
    let state = test_state();
    let stub = StubBackend::new("toxicity", "x");
    let closes = stub.close_count();
    state.backend_registry.add(Arc::new(stub)).unwrap();
    let app = create_router(state.clone());

    let (status, body) = send(app.clone(), Method::DELETE, "/v1/backends/toxicity", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(state.backend_registry.is_empty());
    assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);

    let (status, body) = send(app, Method::DELETE, "/v1/backends/toxicity", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], json!("backend_not_found"));
}

#[tokio::test]
async fn test_register_unreachable_backend_is_bad_request() {
    let state = test_state();

    let (status, body) = send(
        create_router(state.clone()),
        Method::POST,
        "/v1/backends",
        Some(json!({"url": "http://127.0.0.1", "port": "1", "model_name": "toxicity", "timeout_ms": 500})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());
    assert!(state.backend_registry.is_empty());
}

#[tokio::test]
async fn test_register_duplicate_backend_conflicts() {
    let state = test_state();
    state
        .backend_registry
        .add(Arc::new(StubBackend::new("toxicity", "x")))
        .unwrap();

    let (status, _) = send(
        create_router(state.clone()),
        Method::POST,
        "/v1/backends",
        Some(json!({"url": "http://127.0.0.1", "port": 1, "model_name": "toxicity"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(state.backend_registry.len(), 1);
}

#[tokio::test]
async fn test_register_requires_model_name() {
    let (status, _) = send(
        create_router(test_state()),
        Method::POST,
        "/v1/backends",
        Some(json!({"url": "http://127.0.0.1", "port": 8000, "model_name": "  "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_on_batch_is_accepted() {
    let (status, body) = send(
        create_router(test_state()),
        Method::POST,
        "/v1/predict_on_batch",
        Some(json!({"texts": [{"text_id": "1", "text": "hello"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({"status": "texts received"}));
}

#[tokio::test]
async fn test_delivery_endpoint_can_be_replaced() {
    let app = create_router(test_state());

    let (status, body) = send(app.clone(), Method::GET, "/v1/delivery_endpoint", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"endpoint": null}));

    let (status, body) = send(
        app.clone(),
        Method::PUT,
        "/v1/delivery_endpoint?new_endpoint=http%3A%2F%2Fplatform.local%2Fpredictions",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"endpoint": "http://platform.local/predictions"}));

    let (_, body) = send(app.clone(), Method::GET, "/v1/delivery_endpoint", None).await;
    assert_eq!(body, json!({"endpoint": "http://platform.local/predictions"}));

    let (_, body) = send(app, Method::PUT, "/v1/delivery_endpoint?new_endpoint=", None).await;
    assert_eq!(body, json!({"endpoint": null}));
}

#[tokio::test]
async fn test_health_reports_backend_readiness() {
    let state = test_state();
    let app = create_router(state.clone());

    let (status, body) = send(app.clone(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("degraded"));
    assert_eq!(body["backends"], json!({"total": 0, "ready": 0}));

    state
        .backend_registry
        .add(Arc::new(StubBackend::new("toxicity", "x")))
        .unwrap();

    let (_, body) = send(app, Method::GET, "/health", None).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["backends"], json!({"total": 1, "ready": 1}));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}
