//! HTTP client for a running relay.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::constants::{ROUTE_HEALTH, ROUTE_REVIEW, USER_AGENT};
use crate::models::wire::{ErrorBody, HealthBody};
use crate::models::{RawFileDiff, ReviewMode, ReviewRequest, ReviewResponse, Suggestion};

/// Errors talking to the relay.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("{reason}: {source}")]
    Transport {
        reason: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("relay returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode relay response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(source: reqwest::Error) -> Self {
        let reason = if source.is_timeout() {
            "Request timed out"
        } else if source.is_connect() {
            "Relay unreachable"
        } else {
            "Request failed"
        };
        ClientError::Transport { reason, source }
    }
}

/// Client for one relay review endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// `endpoint` is the full review URL, e.g. `http://localhost:3000/review`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the diff and return the relay's suggestions.
    pub async fn review(
        &self,
        diff_data: &[RawFileDiff],
        review_mode: ReviewMode,
    ) -> Result<Vec<Suggestion>, ClientError> {
        let request = ReviewRequest {
            diff_data: diff_data.to_vec(),
            review_mode,
        };
        debug!(endpoint = %self.endpoint, files = diff_data.len(), "posting review request");

        let resp = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: ReviewResponse =
            serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(body.suggestions)
    }

    /// GET the relay's health endpoint.
    ///
    /// A 500 with a well-formed body (missing credential) is returned as
    /// `Ok` so callers can show the relay's own message.
    pub async fn health(&self) -> Result<HealthBody, ClientError> {
        let resp = self.http.get(self.health_url()).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        match serde_json::from_str::<HealthBody>(&text) {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            }),
            Err(e) => Err(ClientError::Decode(e.to_string())),
        }
    }

    /// Health URL derived from the review endpoint.
    pub fn health_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let base = base.strip_suffix(ROUTE_REVIEW).unwrap_or(base);
        format!("{base}{ROUTE_HEALTH}")
    }
}

/// The relay's `message` field when the body is an error object, else the raw text.
fn error_message(text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => body.message,
        Err(_) => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> RelayClient {
        RelayClient::new(endpoint, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn health_url_replaces_review_route() {
        assert_eq!(client("http://localhost:3000/review").health_url(), "http://localhost:3000/health");
        assert_eq!(client("http://localhost:3000/review/").health_url(), "http://localhost:3000/health");
        assert_eq!(client("http://relay.local/api").health_url(), "http://relay.local/api/health");
    }

    #[test]
    fn error_message_prefers_body_message() {
        assert_eq!(
            error_message(r#"{"error":"Invalid request","message":"Missing or invalid diffData"}"#),
            "Missing or invalid diffData"
        );
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        let client = client("http://127.0.0.1:9/review");
        let err = client.review(&[], ReviewMode::Full).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }), "got: {err}");
    }
}
