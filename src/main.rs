//! diffscout: review pull-request diffs from rendered pages with an LLM.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use diffscout::client::RelayClient;
use diffscout::config::Config;
use diffscout::constants;
use diffscout::env::Env;
use diffscout::extract;
use diffscout::messaging::{self, FileSettingsStore, MessageRouter};
use diffscout::normalize;
use diffscout::providers::{self, RigProvider};
use diffscout::relay;
use diffscout::session::{DirectBackend, ReviewBackend, ReviewOutcome, ReviewSession};
use diffscout::watch::{self, WatchOutcome, WatchSettings};

use std::io::Read;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use scraper::Html;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::args::{
    Cli, Command, ExtractArgs, ExtractFormat, HealthArgs, MessageArgs, PlaceArgs, ReviewArgs,
    ServeArgs,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // The relay logs requests at info; other commands stay quiet by default.
    let base = u8::from(matches!(cli.command, Command::Serve(_)));
    init_tracing(base.saturating_add(cli.verbose));

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Extract(args) => run_extract(args).await,
        Command::Review(args) => run_review(args).await,
        Command::Place(args) => run_place(args).await,
        Command::Health(args) => run_health(args).await,
        Command::Message(args) => run_message(args),
        Command::Version => run_version(),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={level}", constants::APP_NAME)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().ok();
    Config::load(cwd.as_deref(), &Env::real()).context("failed to load configuration")
}

async fn read_page(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn wait_if_requested(path: &Path, wait: bool, config: &Config) {
    if !wait {
        return;
    }
    if watch::wait_for_diff_content(path, WatchSettings::from(&config.watch)).await
        == WatchOutcome::TimedOut
    {
        warn!(path = %path.display(), "no diff content appeared before the timeout");
    }
}

/// Print version information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    relay::serve(&config).await?;
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let config = load_config()?;
    wait_if_requested(&args.file, args.wait, &config).await;

    let source = read_page(&args.file).await?;
    let diff_data = extract::extract_from_str(&source).to_wire();
    if diff_data.is_empty() {
        bail!("no code changes found in {}", args.file.display());
    }

    match args.format {
        ExtractFormat::Json => println!("{}", serde_json::to_string_pretty(&diff_data)?),
        ExtractFormat::Context => print!("{}", normalize::normalize(&diff_data)),
    }
    Ok(())
}

async fn run_review(args: ReviewArgs) -> Result<()> {
    args.validate().map_err(anyhow::Error::msg)?;

    let mut config = load_config()?;
    config.client.override_endpoint(args.endpoint.clone());
    let mode = args.mode.unwrap_or(config.client.review_mode);

    wait_if_requested(&args.file, args.wait, &config).await;
    let source = read_page(&args.file).await?;

    let backend: Box<dyn ReviewBackend> = if args.direct {
        let provider = RigProvider::new(config.provider.clone())
            .context("cannot review directly without a configured provider")?;
        Box::new(DirectBackend::new(Arc::new(provider)))
    } else {
        Box::new(RelayClient::new(
            config.client.endpoint.clone(),
            config.client.timeout(),
        )?)
    };

    let session = ReviewSession::new(mode);
    let outcome = if args.quiet {
        session.run(&source, backend.as_ref()).await?
    } else {
        session
            .run_with_status(&source, backend.as_ref(), &cli::print_status)
            .await?
    };

    print!("{}", args.format.render(&outcome));
    Ok(())
}

async fn run_place(args: PlaceArgs) -> Result<()> {
    let source = read_page(&args.file).await?;
    let raw = tokio::fs::read_to_string(&args.suggestions)
        .await
        .with_context(|| format!("failed to read {}", args.suggestions.display()))?;
    let suggestions = providers::parse_suggestions_response(&raw)
        .with_context(|| format!("invalid suggestions in {}", args.suggestions.display()))?;

    let html = Html::parse_document(&source);
    let outcome = ReviewOutcome::from_placement(args.mode, &html, &suggestions);
    print!("{}", args.format.render(&outcome));
    Ok(())
}

async fn run_health(args: HealthArgs) -> Result<()> {
    use colored::Colorize;

    let mut config = load_config()?;
    config.client.override_endpoint(args.endpoint);
    let client = RelayClient::new(config.client.endpoint.clone(), config.client.timeout())?;

    let body = client
        .health()
        .await
        .with_context(|| format!("relay unreachable at {}", client.health_url()))?;
    if body.status == "ok" {
        println!("  {} {}", "✔".green().bold(), body.message);
        Ok(())
    } else {
        bail!("relay reported {}: {}", body.status, body.message)
    }
}

fn run_message(args: MessageArgs) -> Result<()> {
    let raw = match args.json {
        Some(json) => json,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read message from stdin")?;
            buf
        }
    };

    let path = match args.settings_file {
        Some(path) => path,
        None => FileSettingsStore::default_path()
            .context("no config directory available for settings")?,
    };
    let mut router = MessageRouter::new(FileSettingsStore::new(path));
    let response: messaging::ExtensionResponse = router.handle_json(raw.trim());
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
