//! Router configuration for the API.

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware};
use tower_http::timeout::TimeoutLayer;

use crate::api::handlers;
use crate::api::middleware::{logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware - generates/propagates request IDs
/// 2. Logging middleware - opens the request span
/// 3. Timeout - bounds the response time; outbound sends outlive it
///
/// # Routes
/// - `/health`, `/health/live` - Health checks
/// - `/api/notification-requests/{request_id}` - Notification trigger
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = Router::new().nest(
        "/notification-requests",
        handlers::notification_requests::notification_request_routes(),
    );

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
