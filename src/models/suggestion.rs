//! Suggestions returned by the model and the severity taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::wire::lenient_line_number;

/// Severity level of a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational suggestion.
    #[default]
    Info,
    /// Potential issue that should be addressed.
    Warning,
    /// Defect that must be fixed.
    Error,
    /// Security vulnerability.
    Security,
}

impl Severity {
    /// Every level, in display order.
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Security,
    ];

    /// Map an arbitrary severity/priority word onto the four levels.
    ///
    /// Case-insensitive and total: anything unrecognised is `Info`.
    pub fn normalize(raw: &str) -> Severity {
        match raw.trim().to_lowercase().as_str() {
            "low" | "info" | "information" => Severity::Info,
            "medium" | "warn" | "warning" => Severity::Warning,
            "high" | "critical" | "error" => Severity::Error,
            "security" | "vulnerability" => Severity::Security,
            _ => Severity::Info,
        }
    }

    /// Emoji marker used in summaries.
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Security => "🔒",
            Severity::Info => "ℹ️",
        }
    }
}

/// Models return severities in free-form vocabulary ("High", "critical",
/// "vulnerability", numbers, null). All of it funnels through
/// [`Severity::normalize`]; non-strings become `Info`.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) => Severity::normalize(&s),
            _ => Severity::Info,
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Security => write!(f, "security"),
        }
    }
}

/// A review comment anchored to a file and line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub file_path: String,
    #[serde(deserialize_with = "required_line_number")]
    pub line_number: u32,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

fn required_line_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient_line_number(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("lineNumber must be a positive integer"))
}

/// Per-severity counts for a list of suggestions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub security: usize,
}

impl SeverityCounts {
    pub fn from_suggestions(suggestions: &[Suggestion]) -> Self {
        let mut counts = SeverityCounts::default();
        for s in suggestions {
            match s.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
                Severity::Security => counts.security += 1,
            }
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
            Severity::Security => self.security,
        }
    }
}
