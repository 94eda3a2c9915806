//! Shared types used across all modules.
//!
//! This module defines the diff model, the relay wire shapes, and
//! suggestions with their severity taxonomy. Other modules import from
//! here rather than reaching into each other's internals.

pub mod diff;
pub mod suggestion;
pub mod wire;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use diff::{ChangeKind, ChangeLine, DiffDocument, FileDiff, Hunk};
pub use suggestion::{Severity, Suggestion};
pub use wire::{RawDiffChunk, RawFileDiff, ReviewRequest, ReviewResponse};

/// Which review prompt the model is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Quality, bugs, security, performance and readability.
    #[default]
    Full,
    /// Security findings only.
    Security,
    /// Performance findings only.
    Optimization,
}

impl ReviewMode {
    /// Parse a mode name, falling back to [`ReviewMode::Full`] for anything unknown.
    pub fn from_name_lenient(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

/// Unknown or non-string modes fall back to `full` rather than failing the request.
impl<'de> Deserialize<'de> for ReviewMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(ReviewMode::from_name_lenient)
            .unwrap_or_default())
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewMode::Full => write!(f, "full"),
            ReviewMode::Security => write!(f, "security"),
            ReviewMode::Optimization => write!(f, "optimization"),
        }
    }
}

impl std::str::FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(ReviewMode::Full),
            "security" => Ok(ReviewMode::Security),
            "optimization" | "optimisation" | "performance" => Ok(ReviewMode::Optimization),
            other => Err(format!(
                "unsupported review mode: '{other}'. Supported: full, security, optimization"
            )),
        }
    }
}

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    Gemini,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any OpenAI-compatible API (e.g. Ollama, Together, local servers).
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::Anthropic => write!(f, "anthropic"),
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::OpenAICompatible => write!(f, "openai-compatible"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderName::Gemini),
            "anthropic" => Ok(ProviderName::Anthropic),
            "openai" => Ok(ProviderName::OpenAI),
            "openai-compatible" => Ok(ProviderName::OpenAICompatible),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: gemini, anthropic, openai, openai-compatible"
            )),
        }
    }
}

impl ProviderName {
    /// Returns the provider-specific environment variable name for the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
        }
    }

    /// Model used when the config does not name one.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::Gemini => "gemini-2.5-flash",
            ProviderName::Anthropic => "claude-sonnet-4-20250514",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "gpt-4o",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_mode_display_and_parse() {
        for mode in [ReviewMode::Full, ReviewMode::Security, ReviewMode::Optimization] {
            assert_eq!(mode.to_string().parse::<ReviewMode>(), Ok(mode));
        }
        assert_eq!("SECURITY".parse::<ReviewMode>(), Ok(ReviewMode::Security));
        assert!("lint".parse::<ReviewMode>().is_err());
    }

    #[test]
    fn review_mode_deserialize_falls_back_to_full() {
        let mode: ReviewMode = serde_json::from_str("\"optimization\"").unwrap();
        assert_eq!(mode, ReviewMode::Optimization);

        let mode: ReviewMode = serde_json::from_str("\"style\"").unwrap();
        assert_eq!(mode, ReviewMode::Full);

        let mode: ReviewMode = serde_json::from_str("42").unwrap();
        assert_eq!(mode, ReviewMode::Full);
    }

    #[test]
    fn review_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReviewMode::Optimization).unwrap(),
            "\"optimization\""
        );
    }

    #[test]
    fn provider_name_from_str_case_insensitive() {
        assert_eq!("Gemini".parse::<ProviderName>(), Ok(ProviderName::Gemini));
        assert_eq!("OPENAI".parse::<ProviderName>(), Ok(ProviderName::OpenAI));
        assert_eq!(
            "openai-compatible".parse::<ProviderName>(),
            Ok(ProviderName::OpenAICompatible)
        );
    }

    #[test]
    fn provider_name_from_str_invalid() {
        let err = "cohere".parse::<ProviderName>().unwrap_err();
        assert!(err.contains("unsupported provider"));
        assert!(err.contains("cohere"));
    }

    #[test]
    fn provider_name_default_is_gemini() {
        assert_eq!(ProviderName::default(), ProviderName::Gemini);
        assert_eq!(ProviderName::Gemini.api_key_env_var(), "GEMINI_API_KEY");
    }

    #[test]
    fn provider_name_serde_roundtrip() {
        let json = serde_json::to_string(&ProviderName::OpenAICompatible).unwrap();
        assert_eq!(json, "\"openai-compatible\"");
        let back: ProviderName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProviderName::OpenAICompatible);
    }
}
