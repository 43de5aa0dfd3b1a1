//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error that maps domain failures onto HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request before it ever reached a domain service.
    BadRequest(String),
    /// A domain operation failed.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } | DomainError::InvalidId { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyExists { .. }
        | DomainError::ReferencedByOther { .. }
        | DomainError::BookUnavailable(_) => StatusCode::CONFLICT,
        DomainError::ReferenceNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::DependencyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
    }

    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<auth::AuthError> for ApiError {
    fn from(err: auth::AuthError) -> Self {
        ApiError::Domain(DomainError::Unauthenticated(err))
    }
}
