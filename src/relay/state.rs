//! Shared application state for the relay.

use std::sync::Arc;

use crate::providers::ReviewProvider;

/// Shared state accessible by all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no usable credential was configured at startup.
    pub provider: Option<Arc<dyn ReviewProvider>>,
    /// Whether a real credential (not blank, not the sample placeholder) is set.
    pub credential_configured: bool,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(provider: Option<Arc<dyn ReviewProvider>>, credential_configured: bool) -> SharedState {
        Arc::new(Self {
            provider,
            credential_configured,
        })
    }
}
