//! Configuration loading and layering.
//!
//! Handles `.diffscout.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{ClientConfig, Config, ConfigError, ProviderConfig, ServerConfig, WatchConfig};
