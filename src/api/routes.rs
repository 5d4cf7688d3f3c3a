//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use crate::backend::BackendInfo;
use crate::queue::BatchItem;
use crate::response::NormalizedLabel;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Label Zoo Gateway API",
        description = "Fans texts out to Triton classification models and normalizes their labels.",
        license(name = "MIT"),
    ),
    paths(
        handlers::predict,
        handlers::predict_on_text,
        handlers::predict_on_batch,
        handlers::list_backends,
        handlers::register_backend,
        handlers::unregister_backend,
        handlers::get_delivery_endpoint,
        handlers::set_delivery_endpoint,
        handlers::health_check,
    ),
    components(schemas(
        TextList,
        ServiceInput,
        BatchItem,
        BatchAccepted,
        RegisterBackendRequest,
        BackendInfo,
        NormalizedLabel,
        DeliveryEndpointResponse,
        HealthResponse,
        BackendHealthSummary,
        SuccessResponse,
    )),
    tags(
        (name = "Predictions", description = "Prediction endpoints"),
        (name = "Backends", description = "Backend management endpoints"),
        (name = "Delivery", description = "Platform delivery settings"),
        (name = "Health", description = "Health endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let api_routes = Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict_on_text", post(handlers::predict_on_text))
        .route("/predict_on_batch", post(handlers::predict_on_batch))
        .route(
            "/backends",
            get(handlers::list_backends).post(handlers::register_backend),
        )
        .route("/backends/:name", delete(handlers::unregister_backend))
        .route(
            "/delivery_endpoint",
            get(handlers::get_delivery_endpoint).put(handlers::set_delivery_endpoint),
        );

    Router::new()
        // Health check endpoint
        .route("/health", get(handlers::health_check))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/v1", api_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
