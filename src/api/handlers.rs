//! HTTP request handlers

use crate::api::extract::ApiJson;
use crate::api::models::{
    BackendHealthSummary, BatchAccepted, DeliveryEndpointParams, DeliveryEndpointResponse,
    HealthResponse, RegisterBackendRequest, ServiceInput, SuccessResponse, TextList,
};
use crate::backend::BackendInfo;
use crate::config::BackendConfig;
use crate::error::AppError;
use crate::response::NormalizedLabel;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

/// Raw predictions of every registered backend
#[utoipa::path(
    post,
    path = "/v1/predict",
    tag = "Predictions",
    request_body = TextList,
    responses(
        (status = 200, description = "Raw labels per text", body = Vec<Vec<String>>),
        (status = 502, description = "A backend failed")
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<TextList>,
) -> Result<Json<Vec<Vec<String>>>, AppError> {
    info!(texts = request.text_list.len(), "Received predict request");

    let predictions = state.aggregator.predict_all(&request.text_list).await?;

    Ok(Json(predictions))
}

/// Predictions mapped to display names and colors
#[utoipa::path(
    post,
    path = "/v1/predict_on_text",
    tag = "Predictions",
    request_body = TextList,
    responses(
        (status = 200, description = "Normalized labels per text", body = Vec<Vec<NormalizedLabel>>),
        (status = 502, description = "A backend failed")
    )
)]
pub async fn predict_on_text(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<TextList>,
) -> Result<Json<Vec<Vec<NormalizedLabel>>>, AppError> {
    info!(texts = request.text_list.len(), "Received normalized predict request");

    let raw = state.aggregator.predict_all(&request.text_list).await?;

    Ok(Json(state.normalizer.normalize(&raw)))
}

/// Accept a batch for background prediction and delivery
#[utoipa::path(
    post,
    path = "/v1/predict_on_batch",
    tag = "Predictions",
    request_body = ServiceInput,
    responses(
        (status = 202, description = "Batch accepted", body = BatchAccepted),
        (status = 503, description = "Delivery queue is full")
    )
)]
pub async fn predict_on_batch(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ServiceInput>,
) -> Result<(StatusCode, Json<BatchAccepted>), AppError> {
    let texts = request.texts.len();
    let job_id = state.delivery_queue.submit(request.texts)?;

    info!(job_id = %job_id, texts, "Batch accepted");

    Ok((StatusCode::ACCEPTED, Json(BatchAccepted::received())))
}

/// List connected backends
#[utoipa::path(
    get,
    path = "/v1/backends",
    tag = "Backends",
    responses((status = 200, description = "Connected backends", body = Vec<BackendInfo>))
)]
pub async fn list_backends(State(state): State<Arc<AppState>>) -> Json<Vec<BackendInfo>> {
    Json(state.backend_registry.list())
}

/// Connect a Triton model
#[utoipa::path(
    post,
    path = "/v1/backends",
    tag = "Backends",
    request_body = RegisterBackendRequest,
    responses(
        (status = 200, description = "Backend connected", body = SuccessResponse),
        (status = 400, description = "Backend unreachable or misconfigured"),
        (status = 409, description = "Backend already registered")
    )
)]
pub async fn register_backend(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterBackendRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if request.model_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("model_name cannot be empty".to_string()));
    }

    let config = BackendConfig::from(request);
    info!(backend = %config.model_name, endpoint = %config.base_url(), "Connecting backend");

    state.backend_registry.connect(&config).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Backend '{}' connected", config.model_name),
    }))
}

/// Disconnect a backend
#[utoipa::path(
    delete,
    path = "/v1/backends/{name}",
    tag = "Backends",
    params(("name" = String, Path, description = "Model name of the backend")),
    responses(
        (status = 200, description = "Backend removed", body = SuccessResponse),
        (status = 404, description = "Backend not registered")
    )
)]
pub async fn unregister_backend(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    info!(backend = %name, "Disconnecting backend");

    state.backend_registry.remove(&name)?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Backend '{}' removed", name),
    }))
}

/// Current platform endpoint
#[utoipa::path(
    get,
    path = "/v1/delivery_endpoint",
    tag = "Delivery",
    responses((status = 200, description = "Platform endpoint", body = DeliveryEndpointResponse))
)]
pub async fn get_delivery_endpoint(
    State(state): State<Arc<AppState>>,
) -> Json<DeliveryEndpointResponse> {
    Json(DeliveryEndpointResponse {
        endpoint: state.delivery_queue.endpoint(),
    })
}

/// Replace the platform endpoint used for batch delivery
#[utoipa::path(
    put,
    path = "/v1/delivery_endpoint",
    tag = "Delivery",
    params(DeliveryEndpointParams),
    responses((status = 200, description = "Endpoint updated", body = DeliveryEndpointResponse))
)]
pub async fn set_delivery_endpoint(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeliveryEndpointParams>,
) -> Json<DeliveryEndpointResponse> {
    state.delivery_queue.set_endpoint(Some(params.new_endpoint));

    Json(DeliveryEndpointResponse {
        endpoint: state.delivery_queue.endpoint(),
    })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Gateway health", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backends = state.backend_registry.snapshot();
    let total = backends.len();
    let ready = join_all(backends.iter().map(|b| b.is_ready()))
        .await
        .into_iter()
        .filter(|ready| *ready)
        .count();

    let status = if total > 0 && ready == total {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backends: BackendHealthSummary { total, ready },
    })
}
