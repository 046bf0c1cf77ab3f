//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server errors are
//! captured to Sentry and logged, then answered with a generic message.
//! Every error body is JSON: `{"error": "..."}`, plus a `fields` list for
//! validation failures.

use atelier_core::validation::{FieldError, ValidationError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order service failure.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Request failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or wrong admin credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Order(OrderError::Validation(_) | OrderError::InvalidStatus(_))
            | Self::Validation(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Order(OrderError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Order(OrderError::Persistence(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn validation_fields(&self) -> Option<&[FieldError]> {
        match self {
            Self::Order(OrderError::Validation(v)) | Self::Validation(v) => Some(&v.fields),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let error = if status.is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error,
            fields: self.validation_fields(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::StatusParseError;
    use axum::body::to_bytes;

    use super::*;
    use crate::db::RepositoryError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Unauthorized("missing bearer token".to_owned());
        assert_eq!(err.to_string(), "Unauthorized: missing bearer token");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Unauthorized("test".to_owned()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::BadRequest("test".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("test".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(OrderError::NotFound("x".to_owned())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(OrderError::InvalidStatus(StatusParseError {
                field: "status",
                value: "lost".to_owned(),
                allowed: "pending",
            }))
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let err = AppError::from(OrderError::Validation(ValidationError::single(
            "items",
            "must not be empty",
        )));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"][0]["field"], "items");
        assert_eq!(body["fields"][0]["message"], "must not be empty");
        assert!(body["error"].as_str().unwrap().contains("items"));
    }

    #[tokio::test]
    async fn test_rate_limited_body_is_json() {
        let (status, body) = body_json(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limited");
    }

    #[tokio::test]
    async fn test_persistence_error_is_generic() {
        let err = AppError::from(OrderError::Persistence(RepositoryError::Unavailable(
            "connection refused to db-primary:5432".to_owned(),
        )));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("fields").is_none());
    }
}
