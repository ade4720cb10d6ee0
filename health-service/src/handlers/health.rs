use axum::{extract::State, http::StatusCode, Json};

use crate::models::HealthReport;
use crate::AppState;

/// Reports database and cache connectivity.
///
/// Always answers with a JSON report: 200 when both stores are connected,
/// 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All backing services are reachable", body = HealthReport),
        (status = 503, description = "At least one backing service is unreachable", body = HealthReport)
    ),
    tag = "Health Check"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.checker.check().await;
    (report.status_code(), Json(report))
}

/// Readiness probe for orchestrators; same checks, no body.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    state.checker.check().await.status_code()
}
