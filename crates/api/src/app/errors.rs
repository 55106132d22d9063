//! One error shape for every failure: `{"error": {"message", "code"}}`.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use workdesk_auth::{AuthError, PermissionError};
use workdesk_core::DomainError;
use workdesk_infra::InfraError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// The request could not be decoded (body, query or path).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Domain(e) => ApiError::Domain(e),
            InfraError::Store(e) => ApiError::Auth(e.into()),
            InfraError::Password(e) => {
                tracing::error!(error = %e, "password hashing failed");
                ApiError::Auth(AuthError::ServiceUnavailable(e.to_string()))
            }
        }
    }
}

impl ApiError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::Unauthenticated(_) | AuthError::SessionExpired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AccessDenied | AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
                DomainError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::NotFound => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
            },
            ApiError::Permission(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) => "validation_error",
                DomainError::InvalidId(_) => "invalid_id",
                DomainError::InvariantViolation(_) => "invariant_violation",
                DomainError::NotFound => "not_found",
                DomainError::Conflict(_) => "conflict",
            },
            ApiError::Permission(_) => "unknown_permission",
            ApiError::Rejected { .. } => "invalid_request",
        }
    }

    /// Auth failures expose only their fixed public message.
    fn message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.public_message().to_string(),
            ApiError::Domain(DomainError::Validation(msg))
            | ApiError::Domain(DomainError::InvariantViolation(msg))
            | ApiError::Domain(DomainError::InvalidId(msg))
            | ApiError::Domain(DomainError::Conflict(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        json_error(status, self.code(), self.message())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": {
                "message": message.into(),
                "code": code,
            }
        })),
    )
        .into_response()
}

pub async fn not_found() -> ApiError {
    ApiError::Domain(DomainError::NotFound)
}

/// Rewrite framework-generated failures (method not allowed, oversized
/// bodies, ...) into the JSON error shape. Responses that already carry JSON
/// pass through untouched.
pub async fn ensure_error_envelope(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let code = match status {
        StatusCode::METHOD_NOT_ALLOWED => "method_not_allowed",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        s if s.is_server_error() => "internal_error",
        _ => "invalid_request",
    };
    let message = status.canonical_reason().unwrap_or("request failed");

    let (mut parts, _) = response.into_parts();
    let body = json!({ "error": { "message": message, "code": code } }).to_string();
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
