//! Request/response messages exchanged between extension components.
//!
//! The background worker, content agent and popup talk in small tagged JSON
//! messages (`{"type":"GET_SETTINGS"}` and so on). Each message gets exactly
//! one response. Settings persistence is behind [`SettingsStore`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_ENDPOINT;
use crate::models::ReviewMode;

static PULL_REQUEST_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/[^/]+/[^/]+/pull/\d+").unwrap());

/// User-facing extension settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_endpoint: String,
    pub review_mode: ReviewMode,
    pub enable_dark_mode: bool,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            review_mode: ReviewMode::Full,
            enable_dark_mode: true,
            debug_mode: true,
        }
    }
}

/// Every message kind, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    GetSettings,
    SaveSettings { settings: Settings },
    ToggleReviewPanel,
    Initialize,
    Log { message: String },
    TestConnection,
}

/// The single reply to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtensionResponse {
    fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Errors persisting settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for [`Settings`].
pub trait SettingsStore {
    /// Stored settings, with defaults for anything never saved.
    fn load(&self) -> Settings;
    fn save(&mut self, settings: Settings) -> Result<(), SettingsError>;
}

/// Keeps settings in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Option<Settings>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Settings {
        self.settings.clone().unwrap_or_default()
    }

    fn save(&mut self, settings: Settings) -> Result<(), SettingsError> {
        self.settings = Some(settings);
        Ok(())
    }
}

/// Keeps settings in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/diffscout/settings.json`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    /// Unreadable or malformed files fall back to defaults.
    fn load(&self) -> Settings {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Settings::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring malformed settings file");
            Settings::default()
        })
    }

    fn save(&mut self, settings: Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&settings)?;
        write_creating_dirs(&self.path, &json).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_creating_dirs(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// State of the review affordance on the current page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    /// The review control has been injected into the page.
    pub affordance_present: bool,
    /// Number of times the panel was toggled.
    pub toggles: u32,
}

/// Dispatches messages to settings storage and page state.
#[derive(Debug, Default)]
pub struct MessageRouter<S: SettingsStore> {
    store: S,
    panel: PanelState,
}

impl<S: SettingsStore> MessageRouter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            panel: PanelState::default(),
        }
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one message and produce its reply.
    pub fn handle(&mut self, message: ExtensionMessage) -> ExtensionResponse {
        debug!(?message, "extension message");
        match message {
            ExtensionMessage::GetSettings => ExtensionResponse {
                settings: Some(self.store.load()),
                ..ExtensionResponse::ok()
            },
            ExtensionMessage::SaveSettings { settings } => match self.store.save(settings) {
                Ok(()) => ExtensionResponse::ok(),
                Err(e) => ExtensionResponse::failed(e.to_string()),
            },
            ExtensionMessage::Log { message } => {
                info!(target: "diffscout::extension", "{message}");
                ExtensionResponse::ok()
            }
            ExtensionMessage::Initialize => {
                self.panel.affordance_present = true;
                ExtensionResponse::ok()
            }
            ExtensionMessage::ToggleReviewPanel => {
                if self.panel.affordance_present {
                    self.panel.toggles += 1;
                    ExtensionResponse::ok()
                } else {
                    // Inject now so the next toggle finds it.
                    self.panel.affordance_present = true;
                    ExtensionResponse::failed("Review button not found")
                }
            }
            ExtensionMessage::TestConnection => ExtensionResponse::ok(),
        }
    }

    /// Decode a raw JSON message and handle it.
    pub fn handle_json(&mut self, raw: &str) -> ExtensionResponse {
        match serde_json::from_str::<ExtensionMessage>(raw) {
            Ok(message) => self.handle(message),
            Err(e) => ExtensionResponse::failed(format!("unrecognised message: {e}")),
        }
    }
}

/// Whether `url` is a pull request page (`github.com/<owner>/<repo>/pull/<n>`).
pub fn is_pull_request_url(url: &str) -> bool {
    PULL_REQUEST_URL_RE.is_match(url)
}
