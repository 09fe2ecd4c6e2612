//! Error handler for converting AppError to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_to_response_with_request_id(self, None)
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
///
/// - Validation, BadRequest → 400
/// - Delivery → 502
/// - Configuration, Credentials, Internal → 500
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Delivery { .. } => StatusCode::BAD_GATEWAY,
        AppError::Configuration { .. } | AppError::Credentials { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Converts an AppError into a JSON error response, tagged with the request ID when known
///
/// Server-side failures are logged in full and rendered with a generic message.
pub fn error_to_response_with_request_id(error: AppError, request_id: Option<&str>) -> Response {
    let status = error_to_status_code(&error);

    let message = if status.is_server_error() {
        tracing::error!(error = ?error, request_id, "Request failed");
        match &error {
            AppError::Delivery { .. } => "Messaging backend request failed".to_string(),
            _ => "An internal error occurred".to_string(),
        }
    } else {
        error.to_string()
    };

    let mut body = ErrorResponse::new(error.code(), &message);
    if let Some(request_id) = request_id {
        body = body.with_request_id(request_id);
    }

    (status, Json(body)).into_response()
}

/// Converts axum JSON rejection errors to ErrorResponse.
pub fn handle_json_rejection(rejection: JsonRejection, request_id: Option<&str>) -> Response {
    let body = match &rejection {
        JsonRejection::JsonDataError(err) => {
            ErrorResponse::new("INVALID_JSON", "Request body does not match the expected shape")
                .with_details(&err.body_text())
        }
        JsonRejection::JsonSyntaxError(err) => {
            ErrorResponse::new("JSON_SYNTAX_ERROR", "JSON syntax error")
                .with_details(&err.body_text())
        }
        JsonRejection::MissingJsonContentType(_) => ErrorResponse::new(
            "MISSING_CONTENT_TYPE",
            "Missing or invalid Content-Type header",
        )
        .with_details("expected application/json"),
        JsonRejection::BytesRejection(_) => {
            ErrorResponse::new("REQUEST_BODY_ERROR", "Failed to read request body")
        }
        _ => ErrorResponse::new("JSON_ERROR", "Failed to parse JSON request"),
    };

    let body = match request_id {
        Some(request_id) => body.with_request_id(request_id),
        None => body,
    };

    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
