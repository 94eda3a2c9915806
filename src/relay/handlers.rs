//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use super::error::ApiError;
use super::state::SharedState;
use crate::models::wire::HealthBody;
use crate::models::{RawFileDiff, ReviewMode, ReviewRequest, ReviewResponse};
use crate::normalize;

const INVALID_DIFF_DATA: &str = "Missing or invalid diffData";

/// `POST /review`: normalize the diff, ask the model, return its suggestions.
pub async fn review(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::TooLarge(rejection.body_text()),
        _ => ApiError::BadRequest(INVALID_DIFF_DATA.to_string()),
    })?;
    let request = validate_review_body(&body)?;

    let provider = state.provider.as_ref().ok_or_else(|| {
        ApiError::NotConfigured("AI provider is not initialized. Check your API key.".to_string())
    })?;

    let context = normalize::normalize(&request.diff_data);
    info!(
        files = request.diff_data.len(),
        mode = %request.review_mode,
        provider = %provider.label(),
        "review requested"
    );

    let suggestions = provider
        .review(request.review_mode, &context)
        .await
        .map_err(ApiError::Provider)?;
    info!(suggestions = suggestions.len(), "review complete");
    Ok(Json(ReviewResponse { suggestions }))
}

/// `diffData` must be a non-empty array of file objects. An unknown or
/// absent `reviewMode` means `full`.
fn validate_review_body(body: &Value) -> Result<ReviewRequest, ApiError> {
    let invalid = || ApiError::BadRequest(INVALID_DIFF_DATA.to_string());

    let entries = body
        .get("diffData")
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())
        .ok_or_else(invalid)?;
    let diff_data = entries
        .iter()
        .map(|entry| serde_json::from_value::<RawFileDiff>(entry.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let review_mode = body
        .get("reviewMode")
        .and_then(Value::as_str)
        .map(ReviewMode::from_name_lenient)
        .unwrap_or_default();

    Ok(ReviewRequest {
        diff_data,
        review_mode,
    })
}

/// `GET /health`: reports whether a credential is configured. Does not
/// check that the credential is valid.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthBody>) {
    if state.credential_configured {
        (
            StatusCode::OK,
            Json(HealthBody {
                status: "ok".to_string(),
                message: "Server is running and API key is set. Note: this does not verify that the key is valid."
                    .to_string(),
            }),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthBody {
                status: "error".to_string(),
                message: missing_key_message(),
            }),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderTestBody {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// `GET /test-provider`: send a trivial prompt and echo the reply.
pub async fn test_provider(State(state): State<SharedState>) -> (StatusCode, Json<ProviderTestBody>) {
    let Some(provider) = state.provider.as_ref().filter(|_| state.credential_configured) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ProviderTestBody {
                status: "error".to_string(),
                message: missing_key_message(),
                response: None,
            }),
        );
    };

    match provider.ping().await {
        Ok(text) => (
            StatusCode::OK,
            Json(ProviderTestBody {
                status: "ok".to_string(),
                message: format!("{} is working correctly", provider.label()),
                response: Some(text),
            }),
        ),
        Err(e) => {
            error!(error = %e, "provider test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProviderTestBody {
                    status: "error".to_string(),
                    message: format!("Provider test failed: {e}"),
                    response: None,
                }),
            )
        }
    }
}

fn missing_key_message() -> String {
    format!(
        "API key is not set. Set {} or the provider-specific key.",
        crate::constants::ENV_API_KEY
    )
}
