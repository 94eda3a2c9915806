//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! relay routes and defaults so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "diffscout";

/// Crate version, as reported by `diffscout version` and `GET /health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent header sent to relays.
pub const USER_AGENT: &str = concat!("diffscout/", env!("CARGO_PKG_VERSION"));

/// Local config filename (e.g. `.diffscout.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".diffscout.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "diffscout";

// ── Relay ───────────────────────────────────────────────────────────

/// Default port the relay listens on.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit for the relay (10 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Default review endpoint used by the client.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/review";

pub const ROUTE_REVIEW: &str = "/review";
pub const ROUTE_HEALTH: &str = "/health";
pub const ROUTE_TEST_PROVIDER: &str = "/test-provider";

/// Credential value shipped in sample `.env` files; treated as unset.
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

/// Two-character marker that opens a hunk header line.
pub const HUNK_MARKER: &str = "@@";

/// Delimiter written after each file block in the prompt context.
pub const FILE_DELIMITER: &str = "\n---\n\n";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "DIFFSCOUT_PROVIDER";
pub const ENV_MODEL: &str = "DIFFSCOUT_MODEL";
pub const ENV_API_KEY: &str = "DIFFSCOUT_API_KEY";
pub const ENV_BASE_URL: &str = "DIFFSCOUT_BASE_URL";
pub const ENV_ENDPOINT: &str = "DIFFSCOUT_ENDPOINT";
pub const ENV_PORT: &str = "PORT";

/// Footer appended to rendered review summaries.
pub const AI_DISCLOSURE: &str = "Suggestions are AI-generated and may be wrong; review before acting.";
