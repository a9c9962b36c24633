//! HTTP error types and their JSON bodies.
//!
//! The bodies mirror what the browser frontend already understands:
//! `{error}` for the directory endpoints and `{status: "error", message}`
//! for feedback.

use crate::errors::{ErrorKind, MeasurementError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server directory could not be listed.
    #[error("Server directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// A feedback submission could not be accepted.
    #[error("Invalid feedback: {0}")]
    Feedback(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::DirectoryUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody { error: msg }),
            )
                .into_response(),
            ApiError::Feedback(_) => (
                StatusCode::BAD_REQUEST,
                Json(StatusBody {
                    status: "error",
                    message: "Failed to submit feedback",
                }),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: msg }),
            )
                .into_response(),
        }
    }
}

impl From<MeasurementError> for ApiError {
    fn from(err: MeasurementError) -> Self {
        match err.kind {
            ErrorKind::DirectoryUnavailable => {
                ApiError::DirectoryUnavailable(err.message)
            }
            _ => ApiError::Internal(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_maps_to_503() {
        let err: ApiError =
            MeasurementError::directory_unavailable("listing refused").into();
        assert!(matches!(err, ApiError::DirectoryUnavailable(ref m) if m == "listing refused"));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_feedback_error_is_bad_request() {
        let response = ApiError::Feedback("rating 9".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_kinds_are_internal() {
        let err: ApiError = MeasurementError::probe_failure("boom").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
