//! JSON shapes exchanged between the extractor and the relay.
//!
//! Field names are camelCase to match what browser-side agents send.

use serde::{Deserialize, Deserializer, Serialize};

use super::suggestion::Suggestion;
use super::ReviewMode;

/// One flat line record as produced by an extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiffChunk {
    #[serde(default, deserialize_with = "lenient_line_number")]
    pub old_line_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_line_number")]
    pub new_line_number: Option<u32>,
    #[serde(default)]
    pub code_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
}

/// Raw per-file entry of `diffData`: a flat, ungrouped list of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileDiff {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub diff_chunks: Vec<RawDiffChunk>,
}

/// Body of `POST /review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub diff_data: Vec<RawFileDiff>,
    #[serde(default)]
    pub review_mode: ReviewMode,
}

/// Successful body of `POST /review`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// Error body returned by the relay on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub message: String,
}

/// Accept a line number as a JSON number, a numeric string, or null.
///
/// Extractors read numbers from markup attributes, so `"12"` is as common
/// as `12`. Anything that is not a positive integer becomes `None`.
pub fn lenient_line_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(line_number_from_value))
}

pub(crate) fn line_number_from_value(value: &serde_json::Value) -> Option<u32> {
    let number = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    number.filter(|n| *n > 0)
}
