//! ReviewProvider trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core so the relay and the direct
//! review path never depend on a specific LLM library.

pub mod prompts;
pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ReviewMode, Suggestion};

pub use self::rig::{classify_error, parse_suggestions_response, RigProvider};

/// Errors from the review provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM-backed code review.
///
/// Implementations build the prompt for `mode`, call the model once, and
/// parse its answer into suggestions. There are no retries.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Review the rendered diff context and return suggestions.
    async fn review(&self, mode: ReviewMode, context: &str) -> Result<Vec<Suggestion>, ProviderError>;

    /// Send a trivial prompt and return the model's raw reply.
    async fn ping(&self) -> Result<String, ProviderError>;

    /// Short label for logs, e.g. `gemini/gemini-2.5-flash`.
    fn label(&self) -> String;
}
