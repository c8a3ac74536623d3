//! Mapping of dashboard errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dkh_admin::AdminError;
use dkh_backend::BackendError;
use serde::{Deserialize, Serialize};

/// Error body returned by every API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
    /// Extra context
    pub details: Option<serde_json::Value>,
}

/// API failure with its status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Create an error response
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                code: code.to_string(),
                details: None,
            },
        }
    }

    /// Status code of the response
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AdminError> for ApiError {
    fn from(error: AdminError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            AdminError::Backend(backend) => match backend {
                BackendError::Authentication { .. } => {
                    (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED")
                }
                BackendError::PermissionDenied { .. } => {
                    (StatusCode::FORBIDDEN, "PERMISSION_DENIED")
                }
                BackendError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                BackendError::Unavailable { .. } | BackendError::Http(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE")
                }
                BackendError::Subscription { .. }
                | BackendError::Protocol { .. }
                | BackendError::Json(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            },
            AdminError::UnknownEntry { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_ENTRY"),
            AdminError::NoPendingDelete => (StatusCode::CONFLICT, "NO_PENDING_DELETE"),
            AdminError::NotSignedIn => (StatusCode::UNAUTHORIZED, "NOT_SIGNED_IN"),
            AdminError::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
