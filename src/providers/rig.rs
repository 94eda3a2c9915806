//! rig-core integration for LLM-backed code review.
//!
//! Uses rig-core's provider clients and Agent abstraction for multi-provider
//! support. Currently supports: Gemini, Anthropic, OpenAI, and any
//! OpenAI-compatible API.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;
use tracing::{debug, error, warn};

use crate::config::ProviderConfig;
use crate::models::{ProviderName, ReviewMode, Suggestion};

use super::prompts;
use super::{ProviderError, ReviewProvider};

/// Maximum tokens per LLM completion response.
///
/// Set high enough to accommodate thinking models that consume part of
/// the budget for internal reasoning tokens.
const MAX_TOKENS: u64 = 65536;

/// Maximum length of LLM response text to include in parse error messages.
const PARSE_ERROR_PREVIEW_LEN: usize = 2000;

/// Build an agent from a rig-core client and prompt it once.
///
/// Always sets `max_tokens`; without it some providers (e.g. Gemini)
/// default to a low limit that truncates responses.
macro_rules! prompt_simple {
    ($client:expr, $model:expr, $system:expr, $user:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .preamble($system)
            .temperature(0.0)
            .max_tokens(MAX_TOKENS)
            .build();
        agent
            .prompt($user)
            .await
            .map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ProviderError::ApiError(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based review provider.
///
/// The provider name in config selects which rig-core client is built.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    ///
    /// Fails when no usable credential is configured; the sample
    /// placeholder key counts as missing.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if !config.has_credential() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var()
            )));
        }
        Ok(Self { config })
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(ref base_url) = self.config.base_url {
            builder = builder.base_url(base_url);
        }
        let client: providers::openai::CompletionsClient = builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create OpenAI client: {e}")))?;
        Ok(client)
    }

    /// Require `base_url` for OpenAI-compatible providers.
    fn require_base_url(&self) -> Result<&str, ProviderError> {
        self.config.base_url.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            )
        })
    }

    /// Get the API key or return an error.
    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .credential()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }

    /// Make a completion call through rig-core and return the raw response text.
    async fn call_rig(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let model = self.config.model();

        match self.config.name {
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                prompt_simple!(client, model, system_prompt, user_prompt, "Gemini")
            }
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
                    })?;
                prompt_simple!(client, model, system_prompt, user_prompt, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key)?;
                prompt_simple!(client, model, system_prompt, user_prompt, "OpenAI")
            }
            ProviderName::OpenAICompatible => {
                let base_url = self.require_base_url()?;
                let client: providers::openai::CompletionsClient =
                    providers::openai::CompletionsClient::builder()
                        .api_key(api_key)
                        .base_url(base_url)
                        .build()
                        .map_err(|e| {
                            ProviderError::ApiError(format!(
                                "failed to create OpenAI-compatible client: {e}"
                            ))
                        })?;
                prompt_simple!(
                    client,
                    model,
                    system_prompt,
                    user_prompt,
                    "OpenAI-compatible"
                )
            }
        }
    }
}

#[async_trait]
impl ReviewProvider for RigProvider {
    async fn review(&self, mode: ReviewMode, context: &str) -> Result<Vec<Suggestion>, ProviderError> {
        let system = prompts::system_prompt(mode);
        let user = prompts::build_user_prompt(context);
        debug!(provider = %self.label(), %mode, context_len = context.len(), "requesting review");

        let response = self.call_rig(system, &user).await?;
        parse_suggestions_response(&response).inspect_err(|e| {
            error!(error = %e, "could not parse model response");
        })
    }

    async fn ping(&self) -> Result<String, ProviderError> {
        self.call_rig(prompts::PING_SYSTEM_PROMPT, prompts::PING_USER_PROMPT)
            .await
    }

    fn label(&self) -> String {
        format!("{}/{}", self.config.name, self.config.model())
    }
}

/// Classifies a provider error into a short, user-friendly message.
///
/// Returns `Some(message)` for recognised failure classes, `None` otherwise.
pub fn classify_error(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::ApiError(msg) => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("401")
                || msg_lower.contains("403")
                || msg_lower.contains("api key")
                || msg_lower.contains("unauthorized")
            {
                Some("Authentication failed")
            } else if msg_lower.contains("429")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("quota")
            {
                Some("Rate limited by API")
            } else if msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("high demand")
            {
                Some("High model load")
            } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
                Some("API overloaded")
            } else if msg_lower.contains("502") {
                Some("API gateway error")
            } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
                Some("Request timed out")
            } else if msg_lower.contains("connection") {
                Some("Connection error")
            } else {
                None
            }
        }
        ProviderError::ParseError(_) => Some("Failed to parse AI response"),
        ProviderError::NotConfigured(_) => Some("Provider not configured"),
    }
}

/// Parse the model's reply into suggestions.
///
/// The first balanced `[...]` in the text is taken as the suggestions
/// array; prose or code fences around it are ignored. Brackets inside JSON
/// string literals do not count towards the balance. A reply with no
/// balanced array, or whose array is not valid JSON, is a parse error.
/// Entries that are not valid suggestions (a null or zero `lineNumber`, a
/// missing `filePath`) are skipped with a warning.
pub fn parse_suggestions_response(response: &str) -> Result<Vec<Suggestion>, ProviderError> {
    let preview = || &response[..floor_char_boundary(response, PARSE_ERROR_PREVIEW_LEN)];

    let Some(array) = first_balanced_array(response) else {
        return Err(ProviderError::ParseError(format!(
            "no JSON array found in response. Response: {}",
            preview()
        )));
    };

    let entries = serde_json::from_str::<Vec<serde_json::Value>>(array).map_err(|e| {
        ProviderError::ParseError(format!(
            "could not parse suggestions JSON: {e}. Response: {}",
            preview()
        ))
    })?;

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Suggestion>(entry) {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                warn!(index, error = %e, "skipping invalid suggestion");
                None
            }
        })
        .collect())
}

/// The first `[` ... `]` span whose brackets balance, scanning string
/// literals as opaque.
fn first_balanced_array(text: &str) -> Option<&str> {
    text.match_indices('[')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the balanced bracket group at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
