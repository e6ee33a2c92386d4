//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Caller identity missing or malformed.
    Unauthorized(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => internal(&msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(detail: &str) -> (StatusCode, String) {
    tracing::error!(error = %detail, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    // Clients see the business rule, not the layer it came from.
    let message = match &err {
        DomainError::Order(order_err) => order_err.to_string(),
        DomainError::Store(store_err) => store_err.to_string(),
    };

    match err.kind() {
        ErrorKind::Validation | ErrorKind::InvalidTransition => (StatusCode::BAD_REQUEST, message),
        ErrorKind::NotFound => match &err {
            // Unknown users and products are faults in the request body.
            DomainError::Order(OrderError::OrderNotFound(_)) => (StatusCode::NOT_FOUND, message),
            _ => (StatusCode::BAD_REQUEST, message),
        },
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, message),
        ErrorKind::Internal => internal(&err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
