//! Clap argument types and validation.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use diffscout::messaging::is_pull_request_url;
use diffscout::models::ReviewMode;
use diffscout::output::OutputRenderer;
use diffscout::session::ReviewOutcome;

/// Review pull-request diffs from rendered pages with an LLM.
#[derive(Parser, Debug)]
#[command(name = "diffscout", version = diffscout::constants::VERSION)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run the review relay server.
    Serve(ServeArgs),

    /// Extract the diff from a saved pull-request page.
    Extract(ExtractArgs),

    /// Extract, review and place suggestions for a saved page.
    Review(ReviewArgs),

    /// Place previously obtained suggestions onto a saved page.
    Place(PlaceArgs),

    /// Check a relay's health endpoint.
    Health(HealthArgs),

    /// Handle one extension message (JSON) and print the response.
    Message(MessageArgs),

    /// Print version information.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config and PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the `extract` subcommand.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Saved HTML of the pull-request files page.
    pub file: PathBuf,

    /// Output format.
    #[arg(long, default_value = "json")]
    pub format: ExtractFormat,

    /// Wait for diff content to appear in the file before extracting.
    #[arg(long, default_value_t = false)]
    pub wait: bool,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    /// Saved HTML of the pull-request files page.
    pub file: PathBuf,

    /// Review mode (overrides config).
    #[arg(long)]
    pub mode: Option<ReviewMode>,

    /// Relay review endpoint (overrides config and DIFFSCOUT_ENDPOINT).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Call the configured provider directly instead of a relay.
    #[arg(long, default_value_t = false, conflicts_with = "endpoint")]
    pub direct: bool,

    /// Wait for diff content to appear in the file before reviewing.
    #[arg(long, default_value_t = false)]
    pub wait: bool,

    /// URL the page was saved from; must be a pull-request page.
    #[arg(long)]
    pub url: Option<String>,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Suppress progress messages.
    #[arg(long, short = 'q', default_value_t = false)]
    pub quiet: bool,
}

impl ReviewArgs {
    /// Reject a `--url` that is not a pull-request page.
    pub fn validate(&self) -> Result<(), String> {
        match &self.url {
            Some(url) if !is_pull_request_url(url) => {
                Err(format!("not a pull request page: {url}"))
            }
            _ => Ok(()),
        }
    }
}

/// Arguments for the `place` subcommand.
#[derive(Parser, Debug)]
pub struct PlaceArgs {
    /// Saved HTML of the pull-request files page.
    pub file: PathBuf,

    /// JSON file holding a suggestions array or a `{"suggestions": [...]}` body.
    #[arg(long)]
    pub suggestions: PathBuf,

    /// Review mode recorded in the report.
    #[arg(long, default_value = "full")]
    pub mode: ReviewMode,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Arguments for the `health` subcommand.
#[derive(Parser, Debug)]
pub struct HealthArgs {
    /// Relay review endpoint (overrides config and DIFFSCOUT_ENDPOINT).
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Arguments for the `message` subcommand.
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message JSON, e.g. '{"type":"GET_SETTINGS"}'. Read from stdin when omitted.
    pub json: Option<String>,

    /// Settings file (default: ~/.config/diffscout/settings.json).
    #[arg(long)]
    pub settings_file: Option<PathBuf>,
}

/// Review output formats.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    pub fn render(&self, outcome: &ReviewOutcome) -> String {
        use diffscout::output::json::JsonRenderer;
        use diffscout::output::terminal::TerminalRenderer;

        match self {
            OutputFormat::Terminal => TerminalRenderer.render(outcome),
            OutputFormat::Json => JsonRenderer.render(outcome),
        }
    }
}

/// Extraction output formats.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExtractFormat {
    /// The `diffData` array a relay accepts.
    Json,
    /// The normalized prompt context.
    Context,
}
