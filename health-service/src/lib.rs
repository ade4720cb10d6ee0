pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    extract::State,
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::HealthServiceConfig;
use crate::services::HealthChecker;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health::health_check),
    components(schemas(
        models::HealthReport,
        models::OverallStatus,
        models::ConnectionStatus
    )),
    tags(
        (name = "Health Check", description = "Server and backing service (database, cache) status")
    )
)]
pub struct ApiDoc;

/// OpenAPI document with the health path moved under `prefix`.
pub fn api_doc(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if !prefix.is_empty() {
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| (format!("{}{}", prefix, path), item))
            .collect();
    }
    doc
}

#[derive(Clone)]
pub struct AppState {
    pub config: HealthServiceConfig,
    pub checker: HealthChecker,
}

impl AppState {
    pub fn new(config: HealthServiceConfig, checker: HealthChecker) -> Self {
        Self { config, checker }
    }
}

pub fn build_router(state: AppState) -> Router {
    let prefix = state.config.health_route_prefix.clone();

    let health_routes = Router::new().route("/health", get(handlers::health_check));

    let app = Router::new()
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/.well-known/openapi.json", get(openapi));

    let app = if prefix.is_empty() {
        app.merge(health_routes)
    } else {
        app.nest(&prefix, health_routes)
    };

    app
        // Route-level so the matched path template is available for labels
        .route_layer(from_fn(metrics_middleware))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

async fn openapi(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc(&state.config.health_route_prefix))
}

async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}
