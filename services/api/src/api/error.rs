use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::tokens::TokenError;
use crate::events::{EventError, FieldViolation};

/// JSON error body: `{ "error": ..., "code": ..., "request_id": ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Box<ErrorBody>,
}

impl ApiError {
    fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Box::new(ErrorBody {
                error: message.into(),
                code: code.into(),
                request_id: "unknown".to_string(),
                details: None,
            }),
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.body.request_id = request_id.into();
        self
    }

    pub fn with_details(mut self, details: Vec<FieldViolation>) -> Self {
        if !details.is_empty() {
            self.body.details = Some(details);
        }
        self
    }

    /// Maps an event operation failure onto an HTTP error.
    ///
    /// Store failures are logged here and reported as `failure_message`
    /// without their cause.
    pub fn from_event(err: EventError, request_id: &str, failure_message: &str) -> Self {
        let code = err.code();
        let message = err.to_string();
        let error = match err {
            EventError::Validation { violations, .. } => {
                ApiError::bad_request(code, message).with_details(violations)
            }
            EventError::Unauthenticated => ApiError::unauthorized(code, message),
            EventError::Forbidden => ApiError::forbidden(code, message),
            EventError::NotFound => ApiError::not_found(code, message),
            // Surfaced as a validation-style failure.
            EventError::AlreadyRegistered => ApiError::bad_request(code, message),
            EventError::Store(e) => {
                tracing::error!(error = %e, request_id = %request_id, "{failure_message}");
                ApiError::internal(code, failure_message)
            }
        };
        error.with_request_id(request_id)
    }

    pub fn from_token(err: &TokenError, request_id: &str) -> Self {
        ApiError::unauthorized(err.code(), "Unauthorized").with_request_id(request_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
