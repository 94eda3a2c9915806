//! API error type with automatic JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::models::wire::ErrorBody;
use crate::providers::{classify_error, ProviderError};

pub enum ApiError {
    /// The request body is missing or malformed.
    BadRequest(String),
    /// The body exceeds the configured limit.
    TooLarge(String),
    /// No provider could be built at startup.
    NotConfigured(String),
    /// The provider call or its response parsing failed.
    Provider(ProviderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid request".to_string(),
                    message,
                },
            ),
            ApiError::TooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: "Payload too large".to_string(),
                    message,
                },
            ),
            ApiError::NotConfigured(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Server error".to_string(),
                    message,
                },
            ),
            ApiError::Provider(e) => {
                error!(error = %e, "review failed");
                let message = match classify_error(&e) {
                    Some(reason) => format!("{reason}: {e}"),
                    None => e.to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server error".to_string(),
                        message,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
