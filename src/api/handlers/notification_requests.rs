//! Trigger endpoint for created notification requests.
//!
//! The record store calls this endpoint once per created record, passing the
//! record's identifier in the path and its fields as the JSON body.

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use tracing::Instrument;

use crate::api::dto::AcceptedResponse;
use crate::api::middleware::{RequestId, handle_json_rejection};
use crate::models::NotificationRequest;
use crate::state::AppState;

/// Creates notification request routes.
///
/// # Routes
/// - `POST /{request_id}` - Handle one created notification request
pub fn notification_request_routes() -> Router<AppState> {
    Router::new().route("/{request_id}", post(handle_notification_request))
}

/// Handle one created notification request
///
/// Sends the notifications before answering. The response is `202 Accepted`
/// whatever the delivery outcome; failures are only logged. If the request
/// times out first, the sends still run to completion and are logged.
///
/// # Responses
/// - `202 Accepted` - The request was handled
/// - `400 Bad Request` - The body is not a JSON object
pub async fn handle_notification_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(RequestId(trace_id)): Extension<RequestId>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "Rejected notification request body");
            return handle_json_rejection(rejection, Some(&trace_id));
        }
    };

    // The dispatch runs as its own task so a request timeout or a dropped
    // connection cannot cancel sends that are already in flight.
    let dispatcher = state.services.notifications.clone();
    let id = request_id.clone();
    let task = tokio::spawn(
        async move { dispatcher.handle(&id, &request).await }.instrument(tracing::Span::current()),
    );
    if let Err(err) = task.await {
        tracing::error!(request_id = %request_id, error = %err, "Notification dispatch task failed");
    }

    (StatusCode::ACCEPTED, Json(AcceptedResponse::new(&request_id))).into_response()
}
