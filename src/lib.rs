//! diffscout: extract pull-request diffs from rendered pages, relay them to
//! an LLM for review, and anchor the suggestions back onto the diff.
//!
//! Re-exports public modules for integration tests and external use.

pub mod client;
pub mod config;
pub mod constants;
pub mod env;
pub mod extract;
pub mod messaging;
pub mod models;
pub mod normalize;
pub mod output;
pub mod placement;
pub mod providers;
pub mod relay;
pub mod session;
pub mod watch;
