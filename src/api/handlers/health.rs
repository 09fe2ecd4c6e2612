//! Health check endpoint handlers.
//!
//! The relay keeps no connections open between requests, so health is
//! reported from process state alone.

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};

use crate::api::dto::{HealthResponse, HealthStatus};
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Status, version and provider
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: crate::pkg_version().to_string(),
        timestamp: jiff::Timestamp::now().to_string(),
        provider: state.services.notifications.provider_name().to_string(),
    })
}

/// Liveness probe endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
