//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, so config layering can be
//! exercised without touching the process environment.

use std::collections::HashMap;
use std::str::FromStr;

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up an environment variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// Look up a variable, treating blank values as unset.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a variable into `T`.
    ///
    /// Returns `None` when the variable is unset or blank, and
    /// `Some(Err(raw))` with the raw value when parsing fails.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        self.non_empty(name)
            .map(|raw| raw.parse::<T>().map_err(|_| raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        let env = Env::real();
        assert!(env.var("CARGO_MANIFEST_DIR").is_ok());
    }

    #[test]
    fn mock_env_returns_set_values() {
        let env = Env::mock([("FOO", "bar")]);
        assert_eq!(env.var("FOO").unwrap(), "bar");
        assert!(env.var("NONEXISTENT").is_err());
    }

    #[test]
    fn non_empty_skips_blank_values() {
        let env = Env::mock([("BLANK", "   "), ("SET", " value ")]);
        assert_eq!(env.non_empty("BLANK"), None);
        assert_eq!(env.non_empty("SET").as_deref(), Some("value"));
        assert_eq!(env.non_empty("MISSING"), None);
    }

    #[test]
    fn parse_reports_raw_value_on_failure() {
        let env = Env::mock([("PORT", "8080"), ("BAD_PORT", "eighty")]);
        assert_eq!(env.parse::<u16>("PORT"), Some(Ok(8080)));
        assert_eq!(env.parse::<u16>("BAD_PORT"), Some(Err("eighty".to_string())));
        assert_eq!(env.parse::<u16>("NO_PORT"), None);
    }
}
